//! # Engine 模块
//!
//! 折叠引擎：collapse / restore / update。
//!
//! ## 执行模型
//!
//! ```text
//! collapse(surface, excluded, options)
//!   1. 计算文档高度
//!   2. RootOverrides::acquire（root: overflow=hidden, pointer-events=none）
//!   3. 遍历候选节点：保留区域 → pointer-events=all；其余 → 快照 + 写入动画样式
//!   4. 以 max(delay + speed) 为截止时间启动完成计时器
//!
//! update(dt)   推进计时器，到期时触发一次 on_finish
//! restore()    取消计时器，撤销所有修改
//! ```

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::completion::{CompletionHandle, CompletionTimer, FinishEvent};
use crate::config::{CollapseConfig, CollapseOptions, validate_duration};
use crate::error::{CollapseError, CollapseResult};
use crate::params::AnimationParams;
use crate::selection::{CandidateSelector, in_excluded_subtree};
use crate::session::{CollapseSession, RestoreReport, RootOverrides, SessionId};
use crate::style::{POINTER_EVENTS_ALL, POINTER_EVENTS_NONE};
use crate::surface::{NodeId, Surface};


/// 折叠引擎
///
/// 每个引擎同一时间最多持有一个会话；表面本身也记录持有者，
/// 因此即使换一个引擎也无法在同一表面上开启第二个会话。
pub struct CollapseEngine<R = StdRng> {
    rng: R,
    selector: CandidateSelector,
    session: Option<CollapseSession>,
}

impl Default for CollapseEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for CollapseEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapseEngine")
            .field("selector", &self.selector)
            .field("session", &self.session.as_ref().map(CollapseSession::id))
            .finish()
    }
}

impl CollapseEngine<StdRng> {
    /// 使用系统熵初始化随机数的引擎
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// 固定种子，便于复现
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> CollapseEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            selector: CandidateSelector::default(),
            session: None,
        }
    }

    /// 设置容器类型标签
    pub fn with_container_tag(mut self, tag: impl Into<String>) -> Self {
        self.selector = CandidateSelector::new(tag);
        self
    }

    /// 应用配置中的引擎级设置（容器标签）
    pub fn with_config(self, config: &CollapseConfig) -> Self {
        self.with_container_tag(config.container_tag.clone())
    }

    pub fn selector(&self) -> &CandidateSelector {
        &self.selector
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&CollapseSession> {
        self.session.as_ref()
    }

    /// 执行折叠
    ///
    /// # 参数
    /// - `surface`: 渲染表面，以 body 为根
    /// - `excluded`: 保留区域的根节点（连同整棵子树不参与动画）；`None` 表示不排除
    /// - `options`: 时长与完成回调
    ///
    /// # 错误
    /// - 表面已被某个会话持有：[`CollapseError::SessionAlreadyActive`]
    /// - 时长非法：[`CollapseError::InvalidDuration`]
    /// - `excluded` 不属于该表面：[`CollapseError::NodeNotFound`]
    ///
    /// 出错时不会修改任何样式。
    pub fn collapse(
        &mut self,
        surface: &mut Surface,
        excluded: Option<NodeId>,
        options: CollapseOptions,
    ) -> CollapseResult<CompletionHandle> {
        if let Some(session) = self
            .session
            .as_ref()
            .map(CollapseSession::id)
            .or(surface.active_session())
        {
            return Err(CollapseError::SessionAlreadyActive { session });
        }
        validate_duration(options.duration_ms)?;
        if let Some(node) = excluded {
            surface.ensure(node)?;
        }

        let CollapseOptions {
            duration_ms,
            on_finish,
        } = options;
        let root = surface.body();
        let document_height = surface.document_height();
        let candidates = self.selector.select(surface, root);

        let overrides = RootOverrides::acquire(surface, root);

        let mut snapshots = BTreeMap::new();
        let mut preserved = BTreeMap::new();
        let mut max_completion_ms: f64 = 0.0;

        for node in candidates {
            let keep = in_excluded_subtree(surface, excluded, node);
            let Some(style) = surface.style_mut(node) else {
                continue;
            };

            // 保留区域：只开放交互，不做动画
            if keep {
                let previous = std::mem::replace(&mut style.pointer_events, POINTER_EVENTS_ALL.to_string());
                preserved.entry(node).or_insert(previous);
                continue;
            }

            snapshots.insert(node, style.snapshot());

            let params = AnimationParams::sample(&mut self.rng, duration_ms, document_height);
            style.pointer_events = POINTER_EVENTS_NONE.to_string();
            style.transition = params.transition_css();
            style.transition_delay = params.transition_delay_css();
            style.transform = params.transform_css();
            trace!(
                node = %node,
                delay_ms = params.delay_ms,
                speed_ms = params.speed_ms,
                "节点动画已写入"
            );

            max_completion_ms = max_completion_ms.max(params.completion_ms());
        }

        let id = SessionId::next();
        surface.lock(id);

        let timer = CompletionTimer::new(id, max_completion_ms, snapshots.len(), on_finish);
        let handle = timer.handle();

        debug!(
            session = %id,
            animated = snapshots.len(),
            preserved = preserved.len(),
            document_height = document_height,
            max_completion_ms = max_completion_ms,
            "开始折叠"
        );

        self.session = Some(CollapseSession::new(
            id,
            overrides,
            snapshots,
            preserved,
            document_height,
            timer,
        ));
        Ok(handle)
    }

    /// 推进完成计时器
    ///
    /// 到达截止时间时调用 `on_finish` 并返回完成事件；每个会话仅一次。
    /// 会话在完成后依然保持，直到 [`restore`](Self::restore)。
    pub fn update(&mut self, dt_ms: f64) -> Option<FinishEvent> {
        let event = self.session.as_mut()?.advance(dt_ms)?;
        debug!(
            session = %event.session,
            elapsed_ms = event.elapsed_ms,
            "折叠完成"
        );
        Some(event)
    }

    /// 撤销当前会话的全部修改
    ///
    /// 无会话时为 no-op，返回 `None`。
    /// 若完成回调尚未触发，则将其取消，句柄解析为 `Cancelled`。
    ///
    /// `surface` 必须是持有该会话的表面；否则不做任何修改、会话保留，返回 `None`。
    pub fn restore(&mut self, surface: &mut Surface) -> Option<RestoreReport> {
        let Some(id) = self.session.as_ref().map(CollapseSession::id) else {
            trace!("无进行中的会话，restore 忽略");
            return None;
        };
        if surface.active_session() != Some(id) {
            warn!(
                session = %id,
                holder = ?surface.active_session(),
                "表面未持有该会话，restore 忽略"
            );
            return None;
        }
        let session = self.session.take()?;

        let report = session.revert(surface);
        debug!(
            session = %report.session,
            restored = report.restored,
            cancelled = report.cancelled,
            "已恢复页面"
        );
        Some(report)
    }
}
