//! 领域层：模型、仓储接口与领域服务

pub mod model;
pub mod repository;
pub mod service;

pub use model::*;
pub use repository::{ConversationResolver, MessageRepository, SenderResolver};
pub use service::{MessageStore, MessageStoreDomainConfig};
