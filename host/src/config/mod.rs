//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use collapse_runtime::CollapseConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 宿主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// 折叠效果配置
    #[serde(default)]
    pub collapse: CollapseConfig,

    /// 演示配置
    #[serde(default)]
    pub demo: DemoConfig,

    /// 调试配置
    #[serde(default)]
    pub debug: DebugConfig,
}

/// 演示配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// 每帧时长（毫秒）
    #[serde(default = "default_tick_ms")]
    pub tick_ms: f64,

    /// 随机种子；未配置时每次运行随机生成
    #[serde(default)]
    pub seed: Option<u64>,

    /// 页面描述文件（JSON）；未配置时使用内置演示页面
    #[serde(default)]
    pub page_path: Option<PathBuf>,

    /// 视口高度
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,

    /// 完成后是否恢复页面
    #[serde(default = "default_restore_after_finish")]
    pub restore_after_finish: bool,

    /// 最多推进的帧数
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
}

/// 调试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            seed: None,
            page_path: None,
            viewport_height: default_viewport_height(),
            restore_after_finish: default_restore_after_finish(),
            max_frames: default_max_frames(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// 默认值函数
fn default_tick_ms() -> f64 {
    16.0
}

fn default_viewport_height() -> f64 {
    720.0
}

fn default_restore_after_finish() -> bool {
    true
}

fn default_max_frames() -> u32 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl HostConfig {
    /// 读取配置文件
    ///
    /// 文件不存在时返回 `Ok(None)`，由调用方决定是否使用默认配置。
    pub fn try_load(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(Some(config))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collapse
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        if self.collapse.container_tag.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "container_tag 不能为空".to_string(),
            ));
        }

        if !(self.demo.tick_ms.is_finite() && self.demo.tick_ms > 0.0) {
            return Err(ConfigError::ValidationFailed(format!(
                "帧时长必须大于 0: {}",
                self.demo.tick_ms
            )));
        }

        if !(self.demo.viewport_height.is_finite() && self.demo.viewport_height >= 0.0) {
            return Err(ConfigError::ValidationFailed(format!(
                "视口高度无效: {}",
                self.demo.viewport_height
            )));
        }

        if self.demo.max_frames == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_frames 必须大于 0".to_string(),
            ));
        }

        if crate::logging::parse_level(&self.debug.log_level).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "未知日志级别: {}",
                self.debug.log_level
            )));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// 解析失败
    #[error("配置解析失败: {0}")]
    ParseFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
