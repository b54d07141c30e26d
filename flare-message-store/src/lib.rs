//! 聊天消息存储
//!
//! 提供消息创建、读取、软删除、标签管理与按标签查询，
//! 以及点赞、表情回应、已解决标记等附加操作。

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

pub use config::MessageStoreConfig;
pub use domain::model::{
    ConversationRef, CreateMessageInput, ListMessagesOptions, Message, MessageView, Reaction,
    SenderRef,
};
pub use domain::service::{MessageStore, MessageStoreDomainConfig};
pub use error::{MessageStoreError, MessageStoreResult};
pub use service::{ApplicationBootstrap, ApplicationContext};
