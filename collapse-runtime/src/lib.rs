//! # Collapse Runtime
//!
//! "页面坍塌"效果的核心运行时库。
//!
//! ## 架构概述
//!
//! `collapse-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 它在一棵无头的可视节点树（[`Surface`]）上写入样式，
//! 实际的过渡动画由合成器执行，引擎只负责**调度与等待完成**：
//!
//! ```text
//! Host                              Runtime
//!   │                                  │
//!   │──── collapse(surface, excluded) ►│ 快照 → 写样式 → 启动计时器
//!   │◄─── CompletionHandle ────────────│
//!   │                                  │
//!   │──── update(dt) (每帧) ──────────►│
//!   │◄─── Option<FinishEvent> ─────────│
//!   │                                  │
//!   │──── restore(surface) ───────────►│ 取消计时器 → 写回快照
//! ```
//!
//! ## 核心类型
//!
//! - [`CollapseEngine`]：折叠引擎
//! - [`Surface`]：渲染表面（节点树）
//! - [`CollapseSession`]：一次 collapse → restore 周期的状态
//! - [`CompletionHandle`]：可等待、可取消的完成句柄
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut surface = Surface::new();
//! let overlay = surface.append(surface.body(), "div")?;
//!
//! let mut engine = CollapseEngine::new();
//! let handle = engine.collapse(
//!     &mut surface,
//!     Some(overlay),
//!     CollapseOptions::new().with_duration_ms(8000.0),
//! )?;
//!
//! // 主循环
//! while engine.update(dt).is_none() {}
//!
//! engine.restore(&mut surface);
//! ```

pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod selection;
pub mod session;
pub mod style;
pub mod surface;

// 重导出核心类型
pub use completion::{CompletionHandle, FinishCallback, FinishEvent, FinishOutcome};
pub use config::{CollapseConfig, CollapseOptions, DEFAULT_DURATION_MS};
pub use engine::CollapseEngine;
pub use error::{CollapseError, CollapseResult};
pub use params::AnimationParams;
pub use selection::{CandidateSelector, is_descendant};
pub use session::{CollapseSession, RestoreReport, RootOverrides, SessionId};
pub use style::{StyleRecord, StyleSnapshot};
pub use surface::{BoxMetrics, NodeId, NodeTemplate, Surface, VisualNode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let mut surface = Surface::new();
        let overlay = surface.append(surface.body(), "div").unwrap();

        let mut engine = CollapseEngine::seeded(0);
        let handle = engine
            .collapse(&mut surface, Some(overlay), CollapseOptions::default())
            .unwrap();
        assert!(handle.is_pending());
        assert!(engine.update(0.0).is_some());

        let report: RestoreReport = engine.restore(&mut surface).unwrap();
        assert_eq!(report.restored, 0);
        assert_eq!(report.preserved, 1);
    }
}
