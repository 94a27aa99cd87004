//! # Selection 模块
//!
//! 候选节点选择与祖先判断。
//!
//! 候选集合 = {root 的直接子节点} ∪ {root 子树中所有容器类型节点}，
//! 按文档顺序排列且不重复。注意这不是"所有后代"。

use crate::surface::{NodeId, Surface};

/// 默认容器标签
pub const DEFAULT_CONTAINER_TAG: &str = "div";

/// 候选节点选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSelector {
    container_tag: String,
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_TAG)
    }
}

impl CandidateSelector {
    pub fn new(container_tag: impl Into<String>) -> Self {
        Self {
            container_tag: container_tag.into(),
        }
    }

    pub fn container_tag(&self) -> &str {
        &self.container_tag
    }

    /// 选出 `root` 下的所有候选节点（文档顺序）
    pub fn select(&self, surface: &Surface, root: NodeId) -> Vec<NodeId> {
        surface
            .descendants(root)
            .filter(|&id| {
                surface.parent(id) == Some(root)
                    || surface
                        .node(id)
                        .is_some_and(|n| n.tag.eq_ignore_ascii_case(&self.container_tag))
            })
            .collect()
    }
}

/// 判断 `node` 是否为 `ancestor` 的（严格）后代
///
/// 从 `node` 的父节点开始沿父链向上查找。
/// `node` 缺失、没有父节点，或 `ancestor` 缺失时返回 `false`。
pub fn is_descendant(surface: &Surface, ancestor: Option<NodeId>, node: Option<NodeId>) -> bool {
    let (Some(ancestor), Some(node)) = (ancestor, node) else {
        return false;
    };

    let mut current = surface.parent(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = surface.parent(id);
    }
    false
}

/// `node` 是否位于以 `excluded` 为根的子树中（含自身）
pub fn in_excluded_subtree(surface: &Surface, excluded: Option<NodeId>, node: NodeId) -> bool {
    excluded == Some(node) || is_descendant(surface, excluded, Some(node))
}
