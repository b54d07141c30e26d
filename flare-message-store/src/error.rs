//! 消息存储错误类型定义

use thiserror::Error;

/// 消息存储错误类型
#[derive(Debug, Error)]
pub enum MessageStoreError {
    /// 输入参数格式错误或缺失，调用在访问存储之前即被拒绝
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 消息不存在
    #[error("Message not found: {0}")]
    NotFound(String),

    /// 消息已被软删除，不再接受变更
    #[error("Message is deleted: {0}")]
    Deleted(String),

    /// 底层存储操作失败
    #[error("Persistence error: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

impl MessageStoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// 是否为调用方输入导致的错误（重试无意义）
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}

/// 消息存储结果类型
pub type MessageStoreResult<T> = Result<T, MessageStoreError>;
