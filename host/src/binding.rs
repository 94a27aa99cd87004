//! # Binding 模块
//!
//! `CollapsingPage`：折叠效果的声明式绑定。
//!
//! ## 生命周期
//!
//! ```text
//! collapse: false ──► true    挂载 overlay → collapse(excluded = overlay)
//! collapse: true  ──► true    无操作
//! collapse: true  ──► false   restore（取消未触发的完成回调）→ 卸载 overlay
//! teardown()                  同上（若处于激活状态）
//! ```
//!
//! 保留内容渲染在 body 末尾的固定定位 overlay 中，而不是原来的位置，
//! 因此祖先节点被移走时它仍留在屏幕上。未激活时不渲染任何内容。
//!
//! 表面的 arena 不回收节点，所以卸载后的 overlay 会被缓存，下次激活时重新挂载；
//! 只有保留内容变化时才会重新创建。

use std::rc::Rc;

use collapse_runtime::style::POSITION_FIXED;
use collapse_runtime::{
    CollapseEngine, CollapseOptions, CollapseResult, CompletionHandle, DEFAULT_DURATION_MS,
    FinishEvent, NodeId, NodeTemplate, RestoreReport, Surface,
};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// overlay 容器标签
pub const OVERLAY_TAG: &str = "div";
/// overlay 容器 class
pub const OVERLAY_CLASS: &str = "collapsing-page-overlay";

/// 完成回调（可在多次激活间复用）
pub type FinishHandler = Rc<dyn Fn(&FinishEvent)>;

/// 绑定属性
///
/// 触发字段兼容 `collapse` 与 `destroy` 两种命名，语义相同。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapsingPageProps {
    #[serde(alias = "destroy")]
    pub collapse: bool,

    #[serde(default = "default_duration_ms")]
    pub duration_ms: f64,

    /// 需要保留的内容
    #[serde(default)]
    pub content: Option<NodeTemplate>,
}

fn default_duration_ms() -> f64 {
    DEFAULT_DURATION_MS
}

/// 已挂载的 overlay 与本次激活的完成句柄
#[derive(Debug)]
struct Mounted {
    overlay: NodeId,
    completion: CompletionHandle,
}

/// 折叠效果绑定
///
/// 绑定不持有表面：处于激活状态时直接 drop 会让表面保持折叠并被锁定，
/// 必须先调用 [`teardown`](Self::teardown)。
pub struct CollapsingPage<R = StdRng> {
    engine: CollapseEngine<R>,
    duration_ms: f64,
    on_finish: Option<FinishHandler>,
    content: Option<NodeTemplate>,
    mounted: Option<Mounted>,
    /// 上次卸载的 overlay，下次激活时复用
    parked: Option<NodeId>,
}

impl<R> std::fmt::Debug for CollapsingPage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapsingPage")
            .field("duration_ms", &self.duration_ms)
            .field("content", &self.content.as_ref().map(NodeTemplate::node_count))
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl CollapsingPage<StdRng> {
    /// 使用默认引擎创建绑定
    pub fn new(content: NodeTemplate) -> Self {
        Self::with_engine(CollapseEngine::new(), Some(content))
    }
}

impl<R: Rng> CollapsingPage<R> {
    pub fn with_engine(engine: CollapseEngine<R>, content: Option<NodeTemplate>) -> Self {
        Self {
            engine,
            duration_ms: DEFAULT_DURATION_MS,
            on_finish: None,
            content,
            mounted: None,
            parked: None,
        }
    }

    /// 设置总时长（下次激活生效）
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// 设置完成回调
    pub fn on_finish(mut self, handler: impl Fn(&FinishEvent) + 'static) -> Self {
        self.on_finish = Some(Rc::new(handler));
        self
    }

    pub fn is_active(&self) -> bool {
        self.mounted.is_some()
    }

    /// 当前挂载的 overlay 节点
    pub fn overlay(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|m| m.overlay)
    }

    /// 本次激活的完成句柄
    pub fn completion(&self) -> Option<&CompletionHandle> {
        self.mounted.as_ref().map(|m| &m.completion)
    }

    pub fn engine(&self) -> &CollapseEngine<R> {
        &self.engine
    }

    /// 应用一组新属性
    ///
    /// 时长与内容在下次激活时生效；触发字段立即按状态转换处理。
    pub fn apply_props(
        &mut self,
        surface: &mut Surface,
        props: CollapsingPageProps,
    ) -> CollapseResult<()> {
        self.duration_ms = props.duration_ms;
        if self.content != props.content {
            self.parked = None;
            self.content = props.content;
        }
        self.set_collapse(surface, props.collapse)
    }

    /// 设置触发信号
    ///
    /// 只在状态发生变化时执行 collapse 或 restore。
    pub fn set_collapse(&mut self, surface: &mut Surface, collapse: bool) -> CollapseResult<()> {
        match (self.is_active(), collapse) {
            (false, true) => self.activate(surface),
            (true, false) => {
                self.deactivate(surface)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// 推进完成计时器（每帧调用）
    pub fn update(&mut self, dt_ms: f64) -> Option<FinishEvent> {
        self.engine.update(dt_ms)
    }

    /// 解除绑定：若处于激活状态则恢复页面并卸载 overlay
    ///
    /// 绑定不持有表面，drop 时无法自动恢复。激活状态下销毁绑定前必须调用本方法，
    /// 否则表面会保持折叠，并一直被该会话锁定。
    pub fn teardown(&mut self, surface: &mut Surface) -> CollapseResult<Option<RestoreReport>> {
        self.deactivate(surface)
    }

    fn activate(&mut self, surface: &mut Surface) -> CollapseResult<()> {
        let overlay = self.mount_overlay(surface)?;

        let mut options = CollapseOptions::new().with_duration_ms(self.duration_ms);
        if let Some(handler) = self.on_finish.clone() {
            options = options.on_finish(move |event| handler(&event));
        }

        match self.engine.collapse(surface, Some(overlay), options) {
            Ok(completion) => {
                info!(overlay = %overlay, duration_ms = self.duration_ms, "页面开始折叠");
                self.mounted = Some(Mounted {
                    overlay,
                    completion,
                });
                Ok(())
            }
            Err(e) => {
                surface.detach(overlay)?;
                self.parked = Some(overlay);
                Err(e)
            }
        }
    }

    fn deactivate(&mut self, surface: &mut Surface) -> CollapseResult<Option<RestoreReport>> {
        let Some(mounted) = self.mounted.take() else {
            return Ok(None);
        };

        let report = self.engine.restore(surface);
        if self.engine.is_active() {
            // 表面未持有该会话，保持激活状态
            self.mounted = Some(mounted);
            return Ok(None);
        }
        surface.detach(mounted.overlay)?;
        self.parked = Some(mounted.overlay);
        info!(overlay = %mounted.overlay, "页面已恢复");
        Ok(report)
    }

    /// 在 body 末尾挂载固定定位的 overlay，并渲染保留内容
    ///
    /// 优先复用上次卸载的 overlay；新建时先在树外构建完整子树，再挂到 body 下。
    fn mount_overlay(&mut self, surface: &mut Surface) -> CollapseResult<NodeId> {
        let body = surface.body();
        if let Some(overlay) = self.parked.take()
            && is_parked_overlay(surface, overlay)
        {
            surface.append_child(body, overlay)?;
            debug!(overlay = %overlay, "复用 overlay");
            return Ok(overlay);
        }

        let overlay = surface.create_node(OVERLAY_TAG);
        if let Some(node) = surface.node_mut(overlay) {
            node.class = Some(OVERLAY_CLASS.to_string());
            node.style.position = POSITION_FIXED.to_string();
        }
        if let Some(content) = &self.content {
            surface.instantiate(overlay, content)?;
        }
        surface.append_child(body, overlay)?;
        debug!(overlay = %overlay, "overlay 已挂载");
        Ok(overlay)
    }
}

/// 节点是否为本表面上一个已分离的 overlay
fn is_parked_overlay(surface: &Surface, id: NodeId) -> bool {
    !surface.is_attached(id)
        && surface.parent(id).is_none()
        && surface
            .node(id)
            .is_some_and(|n| n.class.as_deref() == Some(OVERLAY_CLASS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_from_json() {
        let props: CollapsingPageProps = serde_json::from_str(r#"{ "collapse": true }"#).unwrap();
        assert!(props.collapse);
        assert_eq!(props.duration_ms, 8000.0);
        assert!(props.content.is_none());
    }

    #[test]
    fn test_props_destroy_alias() {
        let props: CollapsingPageProps = serde_json::from_str(
            r#"{ "destroy": true, "duration_ms": 500, "content": { "tag": "h1" } }"#,
        )
        .unwrap();
        assert!(props.collapse);
        assert_eq!(props.duration_ms, 500.0);
        assert_eq!(props.content.unwrap().tag, "h1");
    }

    #[test]
    fn test_inactive_renders_nothing() {
        let mut surface = Surface::new();
        let mut page = CollapsingPage::with_engine(
            CollapseEngine::seeded(1),
            Some(NodeTemplate::new("h1")),
        );

        page.set_collapse(&mut surface, false).unwrap();
        assert!(!page.is_active());
        assert!(page.overlay().is_none());
        assert!(surface.children(surface.body()).is_empty());
        assert!(page.teardown(&mut surface).unwrap().is_none());
    }

    #[test]
    fn test_overlay_is_fixed_last_child_of_body() {
        let mut surface = Surface::new();
        let body = surface.body();
        surface.append(body, "main").unwrap();

        let mut page = CollapsingPage::with_engine(
            CollapseEngine::seeded(2),
            Some(NodeTemplate::new("h1")),
        );
        page.set_collapse(&mut surface, true).unwrap();

        let overlay = page.overlay().unwrap();
        assert_eq!(surface.children(body).last(), Some(&overlay));
        let node = surface.node(overlay).unwrap();
        assert_eq!(node.class.as_deref(), Some(OVERLAY_CLASS));
        assert_eq!(node.style.position, POSITION_FIXED);
        assert_eq!(surface.children(overlay).len(), 1);
    }

    #[test]
    fn test_toggle_reuses_overlay() {
        let mut surface = Surface::new();
        let body = surface.body();
        surface.append(body, "main").unwrap();
        let mut page = CollapsingPage::with_engine(
            CollapseEngine::seeded(3),
            Some(NodeTemplate::new("div").child(NodeTemplate::new("h1"))),
        );

        page.set_collapse(&mut surface, true).unwrap();
        let overlay = page.overlay().unwrap();
        let nodes = surface.node_count();

        for _ in 0..5 {
            page.set_collapse(&mut surface, false).unwrap();
            assert!(!surface.is_attached(overlay));
            page.set_collapse(&mut surface, true).unwrap();
            assert_eq!(page.overlay(), Some(overlay));
        }

        // arena 不随切换次数增长
        assert_eq!(surface.node_count(), nodes);
        assert_eq!(surface.children(body).last(), Some(&overlay));
        assert_eq!(page.engine().session().unwrap().preserved_nodes().count(), 2);
    }

    #[test]
    fn test_new_content_builds_new_overlay() {
        let mut surface = Surface::new();
        let mut page = CollapsingPage::with_engine(
            CollapseEngine::seeded(4),
            Some(NodeTemplate::new("h1")),
        );

        page.set_collapse(&mut surface, true).unwrap();
        let first = page.overlay().unwrap();
        page.set_collapse(&mut surface, false).unwrap();

        page.apply_props(
            &mut surface,
            CollapsingPageProps {
                collapse: true,
                duration_ms: 500.0,
                content: Some(NodeTemplate::new("p")),
            },
        )
        .unwrap();
        let second = page.overlay().unwrap();
        assert_ne!(first, second);
        let child = surface.children(second)[0];
        assert_eq!(surface.node(child).unwrap().tag, "p");
        assert!(!surface.is_attached(first));
    }

    #[test]
    fn test_teardown_on_other_surface_keeps_binding_active() {
        let mut surface = Surface::new();
        let mut other = Surface::new();
        let mut page = CollapsingPage::with_engine(
            CollapseEngine::seeded(5),
            Some(NodeTemplate::new("h1")),
        );
        page.set_collapse(&mut surface, true).unwrap();
        let overlay = page.overlay().unwrap();

        assert!(page.teardown(&mut other).unwrap().is_none());
        assert!(page.is_active());
        assert!(surface.is_attached(overlay));

        assert!(page.teardown(&mut surface).unwrap().is_some());
        assert!(surface.active_session().is_none());
    }

    #[test]
    fn test_drop_while_active_leaves_surface_locked() {
        let mut surface = Surface::new();
        let mut page = CollapsingPage::with_engine(CollapseEngine::seeded(6), None);
        page.set_collapse(&mut surface, true).unwrap();
        let session = page.engine().session().unwrap().id();

        // 未调用 teardown：表面保持锁定，新的绑定无法激活
        drop(page);
        assert_eq!(surface.active_session(), Some(session));
        let mut next = CollapsingPage::with_engine(CollapseEngine::seeded(7), None);
        assert!(next.set_collapse(&mut surface, true).is_err());
    }
}
