//! # Session 模块
//!
//! 一次 collapse → restore 周期内的全部可变状态。
//!
//! ## 设计原则
//!
//! - 所有被修改的样式都在会话中**显式记录**（侧表，而不是挂在节点上的属性）
//! - 根节点的 `overflow` / `pointer-events` 由 [`RootOverrides`] 在会话开始时获取，
//!   在 restore 时释放
//! - restore 无论在完成前还是完成后调用，都能完整撤销

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::completion::{CompletionHandle, CompletionTimer, FinishEvent};
use crate::style::{OVERFLOW_HIDDEN, POINTER_EVENTS_NONE, StyleSnapshot};
use crate::surface::{NodeId, Surface};

/// 会话 ID
///
/// 进程内全局唯一，不同引擎开启的会话也不会重复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub(crate) u64);

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

impl SessionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// 根节点在折叠前的 `overflow` / `pointer-events`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootOverrides {
    root: NodeId,
    overflow: String,
    pointer_events: String,
}

impl RootOverrides {
    /// 捕获原值，并设置 `overflow: hidden` / `pointer-events: none`
    pub(crate) fn acquire(surface: &mut Surface, root: NodeId) -> Self {
        let mut overrides = Self {
            root,
            overflow: String::new(),
            pointer_events: String::new(),
        };
        if let Some(style) = surface.style_mut(root) {
            overrides.overflow = std::mem::replace(&mut style.overflow, OVERFLOW_HIDDEN.to_string());
            overrides.pointer_events =
                std::mem::replace(&mut style.pointer_events, POINTER_EVENTS_NONE.to_string());
        }
        overrides
    }

    /// 写回原值
    pub(crate) fn release(&self, surface: &mut Surface) {
        if let Some(style) = surface.style_mut(self.root) {
            style.overflow.clone_from(&self.overflow);
            style.pointer_events.clone_from(&self.pointer_events);
        }
    }

    pub fn overflow(&self) -> &str {
        &self.overflow
    }

    pub fn pointer_events(&self) -> &str {
        &self.pointer_events
    }
}

/// restore 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub session: SessionId,
    /// 写回快照的节点数
    pub restored: usize,
    /// 恢复 `pointer-events` 的保留节点数
    pub preserved: usize,
    /// restore 时完成回调是否已触发
    pub finished: bool,
    /// 是否取消了一个尚未触发的完成回调
    pub cancelled: bool,
}

/// 折叠会话
#[derive(Debug)]
pub struct CollapseSession {
    id: SessionId,
    overrides: RootOverrides,
    /// 被动画节点的样式快照
    snapshots: BTreeMap<NodeId, StyleSnapshot>,
    /// 保留区域节点原先的 `pointer-events`
    preserved: BTreeMap<NodeId, String>,
    document_height: f64,
    timer: CompletionTimer,
}

impl CollapseSession {
    pub(crate) fn new(
        id: SessionId,
        overrides: RootOverrides,
        snapshots: BTreeMap<NodeId, StyleSnapshot>,
        preserved: BTreeMap<NodeId, String>,
        document_height: f64,
        timer: CompletionTimer,
    ) -> Self {
        Self {
            id,
            overrides,
            snapshots,
            preserved,
            document_height,
            timer,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.overrides.root
    }

    pub fn overrides(&self) -> &RootOverrides {
        &self.overrides
    }

    /// 被动画的节点（按 ID 排序）
    pub fn animated_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.snapshots.keys().copied()
    }

    pub fn animated_count(&self) -> usize {
        self.snapshots.len()
    }

    /// 保留区域中被设置为 `pointer-events: all` 的节点
    pub fn preserved_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.preserved.keys().copied()
    }

    pub fn snapshot(&self, node: NodeId) -> Option<&StyleSnapshot> {
        self.snapshots.get(&node)
    }

    pub fn document_height(&self) -> f64 {
        self.document_height
    }

    /// 所有节点 `delay + speed` 的最大值
    pub fn max_completion_ms(&self) -> f64 {
        self.timer.deadline_ms()
    }

    pub fn is_finished(&self) -> bool {
        self.timer.is_finished()
    }

    pub fn completion(&self) -> CompletionHandle {
        self.timer.handle()
    }

    /// 以 JSON 对象导出快照，键为节点 ID
    pub fn snapshots_json(&self) -> serde_json::Value {
        let map = self
            .snapshots
            .iter()
            .map(|(id, snapshot)| {
                (
                    id.value().to_string(),
                    serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }

    pub(crate) fn advance(&mut self, dt_ms: f64) -> Option<FinishEvent> {
        self.timer.advance(dt_ms)
    }

    /// 撤销本会话的全部修改并释放表面
    pub(crate) fn revert(mut self, surface: &mut Surface) -> RestoreReport {
        let finished = self.timer.is_finished();
        let cancelled = self.timer.cancel();

        self.overrides.release(surface);

        for (node, snapshot) in &self.snapshots {
            if let Some(style) = surface.style_mut(*node) {
                style.apply_snapshot(snapshot);
            }
        }
        for (node, pointer_events) in &self.preserved {
            if let Some(style) = surface.style_mut(*node) {
                style.pointer_events.clone_from(pointer_events);
            }
        }

        surface.unlock(self.id);

        RestoreReport {
            session: self.id,
            restored: self.snapshots.len(),
            preserved: self.preserved.len(),
            finished,
            cancelled,
        }
    }
}
