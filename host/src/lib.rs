//! # Host 层
//!
//! 折叠效果的宿主层实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 声明式绑定（`CollapsingPage`）：按触发信号驱动 collapse / restore
//! - 保留内容的 overlay 挂载与卸载
//! - 配置文件与日志初始化
//! - headless 演示页面
//!
//! Host 层不包含折叠逻辑，只负责把生命周期事件转换为 `collapse-runtime` 的调用。

pub mod binding;
pub mod config;
pub mod demo;
pub mod logging;

pub use binding::{CollapsingPage, CollapsingPageProps, FinishHandler, OVERLAY_CLASS};
pub use config::{ConfigError, DebugConfig, DemoConfig, HostConfig};
pub use demo::{DemoReport, PageError, build_surface, demo_overlay, demo_page, load_page, run_demo};
