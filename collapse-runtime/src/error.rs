//! # Error 模块
//!
//! 定义 collapse-runtime 中使用的错误类型。

use thiserror::Error;

use crate::session::SessionId;
use crate::surface::NodeId;

/// 折叠引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollapseError {
    /// 同一页面上已有进行中的会话
    #[error("页面已处于折叠会话 {session} 中，必须先 restore")]
    SessionAlreadyActive { session: SessionId },

    /// 无效的动画时长
    #[error("无效的动画时长 {duration_ms}ms，必须为大于 0 的有限值")]
    InvalidDuration { duration_ms: f64 },

    /// 节点不属于当前页面
    #[error("节点 {node} 不存在")]
    NodeNotFound { node: NodeId },

    /// 挂载会形成环
    #[error("无法将 {child} 挂载到 {parent} 下：会形成环")]
    InvalidHierarchy { parent: NodeId, child: NodeId },
}

/// Result 类型别名
pub type CollapseResult<T> = Result<T, CollapseError>;
