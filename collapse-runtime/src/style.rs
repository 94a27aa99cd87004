//! # Style 模块
//!
//! 节点的内联样式记录，以及折叠开始时捕获的样式快照。
//!
//! 所有字段都是字符串，空串表示"未设置"（与内联样式语义一致），
//! 因此快照 → 恢复是逐字节的字符串往返。

use serde::{Deserialize, Serialize};

/// `overflow: hidden`
pub const OVERFLOW_HIDDEN: &str = "hidden";
/// `pointer-events: none`
pub const POINTER_EVENTS_NONE: &str = "none";
/// `pointer-events: all`
pub const POINTER_EVENTS_ALL: &str = "all";
/// `position: fixed`
pub const POSITION_FIXED: &str = "fixed";

/// 节点内联样式
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleRecord {
    pub pointer_events: String,
    pub transition: String,
    pub transition_delay: String,
    pub transform: String,
    pub overflow: String,
    pub position: String,
}

impl StyleRecord {
    /// 捕获四个动画相关字段
    pub fn snapshot(&self) -> StyleSnapshot {
        StyleSnapshot {
            pointer_events: self.pointer_events.clone(),
            transition: self.transition.clone(),
            transition_delay: self.transition_delay.clone(),
            transform: self.transform.clone(),
        }
    }

    /// 写回快照中的四个字段
    ///
    /// `overflow` / `position` 不在快照范围内，保持不变。
    pub fn apply_snapshot(&mut self, snapshot: &StyleSnapshot) {
        self.pointer_events.clone_from(&snapshot.pointer_events);
        self.transition.clone_from(&snapshot.transition);
        self.transition_delay.clone_from(&snapshot.transition_delay);
        self.transform.clone_from(&snapshot.transform);
    }

    /// 是否带有动画样式（transform / transition / transition-delay 任一非空）
    pub fn is_animated(&self) -> bool {
        !self.transform.is_empty() || !self.transition.is_empty() || !self.transition_delay.is_empty()
    }
}

/// 样式快照
///
/// 每个被动画的节点在一个会话内恰好有一份。
/// JSON 形式使用 camelCase 键：
/// `{"pointerEvents":…,"transition":…,"transitionDelay":…,"transform":…}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSnapshot {
    pub pointer_events: String,
    pub transition: String,
    pub transition_delay: String,
    pub transform: String,
}
