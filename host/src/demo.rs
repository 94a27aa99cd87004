//! # Demo 模块
//!
//! 内置演示页面与 headless 演示流程：
//! 构建页面 → 激活绑定 → 逐帧推进直到完成 → 恢复 → 校验样式往返。

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use collapse_runtime::{
    BoxMetrics, CollapseEngine, CollapseResult, FinishEvent, NodeId, NodeTemplate, RestoreReport,
    StyleRecord, Surface,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::binding::CollapsingPage;
use crate::config::HostConfig;

/// 页面文件错误
#[derive(Debug, Error)]
pub enum PageError {
    #[error("页面文件读取失败 {path}: {message}")]
    Io { path: String, message: String },
    #[error("页面文件解析失败 {path}: {message}")]
    Parse { path: String, message: String },
}

/// 从 JSON 文件加载页面模板
pub fn load_page(path: impl AsRef<Path>) -> Result<NodeTemplate, PageError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| PageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| PageError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn link(label: &str) -> NodeTemplate {
    NodeTemplate::new("li")
        .with_height(24.0)
        .child(NodeTemplate::new("a").with_class(label))
}

fn article() -> NodeTemplate {
    NodeTemplate::new("article").children([
        NodeTemplate::new("div").children([
            NodeTemplate::new("h2").with_height(32.0),
            NodeTemplate::new("p")
                .with_height(20.0)
                .child(NodeTemplate::new("time"))
                .child(NodeTemplate::new("a").with_class("author"))
                .child(NodeTemplate::new("a").with_class("comments")),
        ]),
        NodeTemplate::new("p").with_height(96.0),
    ])
}

/// 内置演示页面：页眉导航、两篇文章、侧栏、页脚
pub fn demo_page() -> NodeTemplate {
    let nav = NodeTemplate::new("nav").child(NodeTemplate::new("ul").children([
        NodeTemplate::new("li")
            .with_height(48.0)
            .child(NodeTemplate::new("img").with_class("logo")),
        link("home"),
        link("users"),
        link("settings"),
        NodeTemplate::new("li")
            .with_height(24.0)
            .child(NodeTemplate::new("button").with_class("logout")),
    ]));

    NodeTemplate::new("div").with_class("page").children([
        NodeTemplate::new("div").with_class("header").child(nav),
        NodeTemplate::new("div").with_class("content").children([
            NodeTemplate::new("div")
                .with_class("articles")
                .children([article(), article()]),
            NodeTemplate::new("aside").children([
                NodeTemplate::new("h2").with_height(32.0),
                NodeTemplate::new("p").with_height(120.0),
            ]),
        ]),
        NodeTemplate::new("footer").child(NodeTemplate::new("p").with_height(40.0)),
    ])
}

/// 折叠后保留在屏幕上的内容
pub fn demo_overlay() -> NodeTemplate {
    NodeTemplate::new("div")
        .with_class("after-collapse")
        .child(NodeTemplate::new("h1").with_height(48.0))
}

/// 以给定视口高度构建表面并完成块级布局
pub fn build_surface(page: &NodeTemplate, viewport_height: f64) -> CollapseResult<Surface> {
    let mut surface = Surface::new();
    surface.set_metrics(
        surface.document_element(),
        BoxMetrics::uniform(viewport_height),
    )?;
    surface.instantiate(surface.body(), page)?;
    surface.layout_blocks();
    Ok(surface)
}

/// 挂在树上的所有节点的样式
fn style_table(surface: &Surface) -> Vec<(NodeId, StyleRecord)> {
    surface
        .descendants(surface.document_element())
        .filter_map(|id| surface.style(id).map(|style| (id, style.clone())))
        .collect()
}

/// 演示报告
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub seed: u64,
    pub duration_ms: f64,
    pub document_height: f64,
    pub animated: usize,
    pub preserved: usize,
    pub max_completion_ms: f64,
    pub frames: u32,
    pub finish: Option<FinishEvent>,
    pub restore: Option<RestoreReport>,
    /// 恢复后样式是否与折叠前完全一致（未恢复时为 `None`）
    pub round_trip_ok: Option<bool>,
    /// 折叠时捕获的快照，键为节点 ID
    pub snapshots: serde_json::Value,
}

/// 运行一次完整的演示
pub fn run_demo(config: &HostConfig, page: &NodeTemplate) -> CollapseResult<DemoReport> {
    let seed = config.demo.seed.unwrap_or_else(rand::random);
    let mut surface = build_surface(page, config.demo.viewport_height)?;
    let before = style_table(&surface);

    let finished = Rc::new(Cell::new(false));
    let flag = Rc::clone(&finished);
    let engine = CollapseEngine::seeded(seed).with_config(&config.collapse);
    let mut binding = CollapsingPage::with_engine(engine, Some(demo_overlay()))
        .with_duration_ms(config.collapse.duration_ms)
        .on_finish(move |event| {
            info!(
                elapsed_ms = event.elapsed_ms,
                animated = event.animated,
                "折叠动画全部结束"
            );
            flag.set(true);
        });

    binding.set_collapse(&mut surface, true)?;

    let (animated, preserved, max_completion_ms, document_height, snapshots) =
        match binding.engine().session() {
            Some(session) => (
                session.animated_count(),
                session.preserved_nodes().count(),
                session.max_completion_ms(),
                session.document_height(),
                session.snapshots_json(),
            ),
            None => (0, 0, 0.0, surface.document_height(), serde_json::Value::Null),
        };

    let mut frames = 0;
    let mut finish = None;
    while frames < config.demo.max_frames {
        frames += 1;
        if let Some(event) = binding.update(config.demo.tick_ms) {
            finish = Some(event);
            break;
        }
    }
    if !finished.get() {
        warn!(frames = frames, "达到最大帧数，折叠尚未完成");
    }

    let (restore, round_trip_ok) = if config.demo.restore_after_finish {
        let report = binding.teardown(&mut surface)?;
        (report, Some(style_table(&surface) == before))
    } else {
        (None, None)
    };

    Ok(DemoReport {
        seed,
        duration_ms: config.collapse.duration_ms,
        document_height,
        animated,
        preserved,
        max_completion_ms,
        frames,
        finish,
        restore,
        round_trip_ok,
        snapshots,
    })
}
