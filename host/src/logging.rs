//! # Logging 模块
//!
//! 初始化 `tracing-subscriber` 的 fmt 输出。

use std::str::FromStr;

use tracing::Level;

/// 解析日志级别（大小写不敏感）
pub fn parse_level(level: &str) -> Option<Level> {
    Level::from_str(level.trim()).ok()
}

/// 初始化全局日志
///
/// 级别无法解析时使用 `info`。重复初始化时返回 `false`。
pub fn init(level: &str) -> bool {
    let level = parse_level(level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("WARN"), Some(Level::WARN));
        assert_eq!(parse_level(" info "), Some(Level::INFO));
        assert_eq!(parse_level("loud"), None);
    }
}
