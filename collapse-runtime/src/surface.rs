//! # Surface 模块
//!
//! 无头渲染表面：一棵由可视节点组成的树。
//!
//! ## 结构
//!
//! ```text
//! html (document element)
//!  └── body (root)
//!       ├── div.page
//!       │    └── ...
//!       └── div (overlay)
//! ```
//!
//! 节点存放在 arena 中，通过 [`NodeId`] 引用。分离（detach）的节点仍保留在
//! arena 中，只是不再挂在树上，因此已发出的 `NodeId` 永远有效。

use serde::{Deserialize, Serialize};

use crate::error::{CollapseError, CollapseResult};
use crate::session::SessionId;
use crate::style::StyleRecord;

/// 节点 ID
///
/// 由 [`Surface`] 分配，按创建顺序递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 盒模型高度读数
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxMetrics {
    pub scroll_height: f64,
    pub offset_height: f64,
    pub client_height: f64,
}

impl BoxMetrics {
    /// 三个读数相同的盒子
    pub fn uniform(height: f64) -> Self {
        Self {
            scroll_height: height,
            offset_height: height,
            client_height: height,
        }
    }
}

/// 可视节点
#[derive(Debug, Clone)]
pub struct VisualNode {
    pub tag: String,
    pub class: Option<String>,
    pub style: StyleRecord,
    pub metrics: BoxMetrics,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl VisualNode {
    fn new(tag: String) -> Self {
        Self {
            tag,
            class: None,
            style: StyleRecord::default(),
            metrics: BoxMetrics::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// 节点模板
///
/// 页面描述文件（JSON）的格式，也是 overlay 内容的载体：
///
/// ```json
/// { "tag": "div", "class": "page", "height": 120.0, "children": [] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub tag: String,
    #[serde(default)]
    pub class: Option<String>,
    /// 节点自身高度（不含子节点）
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub style: StyleRecord,
    #[serde(default)]
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    /// 创建空模板
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: None,
            height: 0.0,
            style: StyleRecord::default(),
            children: Vec::new(),
        }
    }

    /// 设置 class
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// 设置自身高度
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// 设置初始内联样式
    pub fn with_style(mut self, style: StyleRecord) -> Self {
        self.style = style;
        self
    }

    /// 追加子节点
    pub fn child(mut self, child: NodeTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// 追加多个子节点
    pub fn children(mut self, children: impl IntoIterator<Item = NodeTemplate>) -> Self {
        self.children.extend(children);
        self
    }

    /// 模板中的节点总数（含自身）
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeTemplate::node_count).sum::<usize>()
    }
}

/// 渲染表面
#[derive(Debug, Clone)]
pub struct Surface {
    nodes: Vec<VisualNode>,
    document: NodeId,
    body: NodeId,
    /// 持有该表面的折叠会话
    active_session: Option<SessionId>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// 创建只包含 `html > body` 的空表面
    pub fn new() -> Self {
        let mut surface = Self {
            nodes: Vec::new(),
            document: NodeId(0),
            body: NodeId(0),
            active_session: None,
        };
        surface.document = surface.create_node("html");
        surface.body = surface.create_node("body");
        surface.link(surface.document, surface.body);
        surface
    }

    /// document element（`html`）
    pub fn document_element(&self) -> NodeId {
        self.document
    }

    /// 折叠的根节点（`body`）
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// arena 中的节点总数（含已分离节点），至少包含 html 与 body
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 节点是否属于该表面
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// 检查节点存在
    pub fn ensure(&self, id: NodeId) -> CollapseResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(CollapseError::NodeNotFound { node: id })
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&VisualNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut VisualNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleRecord> {
        self.node(id).map(|n| &n.style)
    }

    pub fn style_mut(&mut self, id: NodeId) -> Option<&mut StyleRecord> {
        self.node_mut(id).map(|n| &mut n.style)
    }

    /// 设置盒模型读数
    pub fn set_metrics(&mut self, id: NodeId, metrics: BoxMetrics) -> CollapseResult<()> {
        let node = self
            .node_mut(id)
            .ok_or(CollapseError::NodeNotFound { node: id })?;
        node.metrics = metrics;
        Ok(())
    }

    // ========== 树操作 ==========

    /// 创建一个未挂载的节点
    pub fn create_node(&mut self, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(VisualNode::new(tag.into()));
        id
    }

    /// 将 `child` 挂载为 `parent` 的最后一个子节点
    ///
    /// 若 `child` 已挂在别处，先从原位置分离。
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> CollapseResult<()> {
        self.ensure(parent)?;
        self.ensure(child)?;
        if parent == child || self.is_ancestor_of(child, parent) {
            return Err(CollapseError::InvalidHierarchy { parent, child });
        }
        self.unlink(child);
        self.link(parent, child);
        Ok(())
    }

    /// 创建节点并挂载到 `parent` 下
    pub fn append(&mut self, parent: NodeId, tag: impl Into<String>) -> CollapseResult<NodeId> {
        self.ensure(parent)?;
        let id = self.create_node(tag);
        self.link(parent, id);
        Ok(id)
    }

    /// 按模板创建整棵子树并挂载到 `parent` 下，返回子树根
    pub fn instantiate(&mut self, parent: NodeId, template: &NodeTemplate) -> CollapseResult<NodeId> {
        let id = self.append(parent, template.tag.clone())?;
        if let Some(node) = self.node_mut(id) {
            node.class.clone_from(&template.class);
            node.style = template.style.clone();
            node.metrics = BoxMetrics::uniform(template.height);
        }
        for child in &template.children {
            self.instantiate(id, child)?;
        }
        Ok(id)
    }

    /// 将节点（连同子树）从树上分离
    pub fn detach(&mut self, id: NodeId) -> CollapseResult<()> {
        self.ensure(id)?;
        self.unlink(id);
        Ok(())
    }

    /// 节点是否挂在 document element 之下
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.document || self.is_ancestor_of(self.document, id)
    }

    /// 严格祖先判断（不含自身）
    fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
    }

    /// 先序遍历 `id` 的所有后代（不含自身），即文档顺序
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants {
            surface: self,
            stack,
        }
    }

    // ========== 度量 ==========

    /// 文档总高度
    ///
    /// 取 body 的 scroll/offset 高度与 document element 的 client/scroll/offset
    /// 高度中的最大值，避免因溢出或裁剪而低估。
    pub fn document_height(&self) -> f64 {
        let body = self.node(self.body).map(|n| n.metrics).unwrap_or_default();
        let html = self
            .node(self.document)
            .map(|n| n.metrics)
            .unwrap_or_default();

        [
            body.scroll_height,
            body.offset_height,
            html.client_height,
            html.scroll_height,
            html.offset_height,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    /// 简单块级布局：子节点纵向堆叠
    ///
    /// 每个节点的 offset/scroll 高度 = max(自身高度, 子节点高度之和)。
    /// document element 的 client 高度保持为视口高度不变。
    pub fn layout_blocks(&mut self) -> f64 {
        let document = self.document;
        let viewport = self.node(document).map(|n| n.metrics.client_height).unwrap_or(0.0);
        let height = self.layout_node(document);
        if let Some(node) = self.node_mut(document) {
            node.metrics.client_height = viewport;
        }
        height
    }

    fn layout_node(&mut self, id: NodeId) -> f64 {
        let children = self.children(id).to_vec();
        let stacked: f64 = children.into_iter().map(|c| self.layout_node(c)).sum();
        let Some(node) = self.node_mut(id) else {
            return 0.0;
        };
        let height = node.metrics.offset_height.max(stacked);
        node.metrics.offset_height = height;
        node.metrics.scroll_height = height;
        height
    }

    // ========== 会话锁 ==========

    /// 当前持有该表面的会话
    pub fn active_session(&self) -> Option<SessionId> {
        self.active_session
    }

    pub(crate) fn lock(&mut self, session: SessionId) {
        self.active_session = Some(session);
    }

    pub(crate) fn unlock(&mut self, session: SessionId) {
        if self.active_session == Some(session) {
            self.active_session = None;
        }
    }
}

/// 先序后代迭代器
pub struct Descendants<'a> {
    surface: &'a Surface,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.surface.children(id).iter().rev().copied());
        Some(id)
    }
}
