//! # Config 模块
//!
//! 折叠效果的配置与单次调用参数。

use serde::{Deserialize, Serialize};

use crate::completion::{FinishCallback, FinishEvent};
use crate::error::{CollapseError, CollapseResult};
use crate::selection::DEFAULT_CONTAINER_TAG;

/// 默认总时长（毫秒）
pub const DEFAULT_DURATION_MS: f64 = 8000.0;

/// 折叠配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseConfig {
    /// 总时长（毫秒），必须大于 0
    #[serde(default = "default_duration_ms")]
    pub duration_ms: f64,

    /// 容器类型标签；此类节点无论层级都参与动画
    #[serde(default = "default_container_tag")]
    pub container_tag: String,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            container_tag: default_container_tag(),
        }
    }
}

impl CollapseConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> CollapseResult<()> {
        validate_duration(self.duration_ms)
    }
}

fn default_duration_ms() -> f64 {
    DEFAULT_DURATION_MS
}

fn default_container_tag() -> String {
    DEFAULT_CONTAINER_TAG.to_string()
}

/// 时长必须为大于 0 的有限值
pub fn validate_duration(duration_ms: f64) -> CollapseResult<()> {
    if duration_ms.is_finite() && duration_ms > 0.0 {
        Ok(())
    } else {
        Err(CollapseError::InvalidDuration { duration_ms })
    }
}

/// 单次 collapse 调用参数
pub struct CollapseOptions {
    pub duration_ms: f64,
    pub on_finish: Option<FinishCallback>,
}

impl Default for CollapseOptions {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            on_finish: None,
        }
    }
}

impl std::fmt::Debug for CollapseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapseOptions")
            .field("duration_ms", &self.duration_ms)
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

impl From<&CollapseConfig> for CollapseOptions {
    fn from(config: &CollapseConfig) -> Self {
        Self::new().with_duration_ms(config.duration_ms)
    }
}

impl CollapseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置总时长
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// 设置完成回调
    pub fn on_finish(mut self, callback: impl FnOnce(FinishEvent) + 'static) -> Self {
        self.on_finish = Some(Box::new(callback));
        self
    }
}
