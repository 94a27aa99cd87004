//! # Completion 模块
//!
//! 折叠完成的单次计时器，以及与会话生命周期绑定的完成句柄。
//!
//! ## 执行模型
//!
//! 计时器由宿主逐帧驱动（`advance(dt_ms)`），累计时间达到截止时间后触发一次。
//! 截止时间为所有节点 `delay + speed` 的最大值，因此触发时刻必然晚于每个节点的动画结束。
//!
//! ```text
//! collapse() ──► CompletionTimer (deadline = max(delay_i + speed_i))
//!                    │ advance(dt) ...
//!                    ├──► Finished  → on_finish(event), handle 就绪
//!                    └──► cancel()  → on_finish 被丢弃, handle = Cancelled
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use serde::Serialize;

use crate::session::SessionId;

/// 完成回调
pub type FinishCallback = Box<dyn FnOnce(FinishEvent)>;

/// 完成事件
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinishEvent {
    pub session: SessionId,
    /// 计划的完成时间（毫秒）
    pub scheduled_ms: f64,
    /// 实际触发时累计经过的时间（毫秒）
    pub elapsed_ms: f64,
    /// 参与动画的节点数
    pub animated: usize,
}

/// 完成结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FinishOutcome {
    /// 所有节点动画已结束
    Finished(FinishEvent),
    /// 会话在完成前被 restore
    Cancelled,
}

#[derive(Debug, Default)]
struct Shared {
    outcome: Option<FinishOutcome>,
    waker: Option<Waker>,
}

impl Shared {
    fn resolve(&mut self, outcome: FinishOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

/// 完成句柄
///
/// 可查询，也可作为 `Future` 等待。会话被 restore 时解析为 [`FinishOutcome::Cancelled`]。
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    shared: Rc<RefCell<Shared>>,
}

impl CompletionHandle {
    /// 当前结果（尚未完成时为 `None`）
    pub fn outcome(&self) -> Option<FinishOutcome> {
        self.shared.borrow().outcome
    }

    pub fn is_pending(&self) -> bool {
        self.outcome().is_none()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.outcome(), Some(FinishOutcome::Finished(_)))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome(), Some(FinishOutcome::Cancelled))
    }
}

impl Future for CompletionHandle {
    type Output = FinishOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<FinishOutcome> {
        let mut shared = self.shared.borrow_mut();
        match shared.outcome {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// 单次完成计时器
pub(crate) struct CompletionTimer {
    session: SessionId,
    deadline_ms: f64,
    elapsed_ms: f64,
    animated: usize,
    on_finish: Option<FinishCallback>,
    shared: Rc<RefCell<Shared>>,
}

impl std::fmt::Debug for CompletionTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionTimer")
            .field("session", &self.session)
            .field("deadline_ms", &self.deadline_ms)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl CompletionTimer {
    pub(crate) fn new(
        session: SessionId,
        deadline_ms: f64,
        animated: usize,
        on_finish: Option<FinishCallback>,
    ) -> Self {
        Self {
            session,
            deadline_ms: deadline_ms.max(0.0),
            elapsed_ms: 0.0,
            animated,
            on_finish,
            shared: Rc::new(RefCell::new(Shared::default())),
        }
    }

    pub(crate) fn handle(&self) -> CompletionHandle {
        CompletionHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    pub(crate) fn deadline_ms(&self) -> f64 {
        self.deadline_ms
    }

    /// 已触发或已取消
    pub(crate) fn is_settled(&self) -> bool {
        self.shared.borrow().outcome.is_some()
    }

    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.shared.borrow().outcome, Some(FinishOutcome::Finished(_)))
    }

    /// 推进时间；到达截止时间时触发并返回完成事件（仅一次）
    ///
    /// 截止时间为 0 时，第一次推进即触发（即使 `dt_ms` 为 0）。
    pub(crate) fn advance(&mut self, dt_ms: f64) -> Option<FinishEvent> {
        if self.is_settled() {
            return None;
        }

        self.elapsed_ms += dt_ms.max(0.0);
        if self.elapsed_ms < self.deadline_ms {
            return None;
        }

        let event = FinishEvent {
            session: self.session,
            scheduled_ms: self.deadline_ms,
            elapsed_ms: self.elapsed_ms,
            animated: self.animated,
        };
        self.shared
            .borrow_mut()
            .resolve(FinishOutcome::Finished(event));
        if let Some(on_finish) = self.on_finish.take() {
            on_finish(event);
        }
        Some(event)
    }

    /// 取消：丢弃尚未调用的回调
    ///
    /// 返回 `true` 表示确实取消了一个未完成的计时器。
    pub(crate) fn cancel(&mut self) -> bool {
        self.on_finish = None;
        if self.is_settled() {
            return false;
        }
        self.shared.borrow_mut().resolve(FinishOutcome::Cancelled);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn poll_once(handle: &mut CompletionHandle) -> Poll<FinishOutcome> {
        let mut cx = Context::from_waker(Waker::noop());
        Pin::new(handle).poll(&mut cx)
    }

    #[test]
    fn test_fires_once_at_deadline() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut timer = CompletionTimer::new(
            SessionId(1),
            100.0,
            3,
            Some(Box::new(move |_| counter.set(counter.get() + 1))),
        );
        let handle = timer.handle();

        assert!(timer.advance(60.0).is_none());
        assert!(handle.is_pending());

        let event = timer.advance(60.0).unwrap();
        assert_eq!(event.scheduled_ms, 100.0);
        assert_eq!(event.elapsed_ms, 120.0);
        assert_eq!(event.animated, 3);
        assert!(handle.is_finished());

        // 不会再次触发
        assert!(timer.advance(1000.0).is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_zero_deadline_fires_on_next_tick() {
        let mut timer = CompletionTimer::new(SessionId(1), 0.0, 0, None);
        let handle = timer.handle();
        assert!(handle.is_pending());

        let event = timer.advance(0.0).unwrap();
        assert_eq!(event.elapsed_ms, 0.0);
        assert!(handle.is_finished());
    }

    #[test]
    fn test_cancel_drops_callback() {
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let mut timer = CompletionTimer::new(
            SessionId(2),
            50.0,
            1,
            Some(Box::new(move |_| flag.set(true))),
        );
        let handle = timer.handle();

        assert!(timer.cancel());
        assert!(handle.is_cancelled());
        assert!(timer.advance(100.0).is_none());
        assert!(!called.get());
        // 二次取消无效果
        assert!(!timer.cancel());
    }

    #[test]
    fn test_cancel_after_finish_keeps_outcome() {
        let mut timer = CompletionTimer::new(SessionId(3), 10.0, 1, None);
        let handle = timer.handle();
        timer.advance(10.0);

        assert!(!timer.cancel());
        assert!(handle.is_finished());
    }

    #[test]
    fn test_handle_as_future() {
        let mut timer = CompletionTimer::new(SessionId(4), 30.0, 2, None);
        let mut handle = timer.handle();

        assert!(poll_once(&mut handle).is_pending());
        timer.advance(30.0);
        match poll_once(&mut handle) {
            Poll::Ready(FinishOutcome::Finished(event)) => assert_eq!(event.animated, 2),
            other => panic!("unexpected poll result: {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_future_resolves() {
        let mut timer = CompletionTimer::new(SessionId(5), 30.0, 2, None);
        let mut handle = timer.handle();
        assert!(poll_once(&mut handle).is_pending());

        timer.cancel();
        assert_eq!(poll_once(&mut handle), Poll::Ready(FinishOutcome::Cancelled));
    }
}
