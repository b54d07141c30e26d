//! 会话 / 发送者引用解析器实现

mod directory;

pub use directory::InMemoryDirectory;

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::domain::model::{ConversationRef, SenderRef};
use crate::domain::repository::{ConversationResolver, SenderResolver};

/// 不查询任何外部目录，只返回仅含 id 的引用
#[derive(Debug, Default, Clone, Copy)]
pub struct IdOnlyResolver;

#[async_trait]
impl ConversationResolver for IdOnlyResolver {
    async fn resolve(&self, conversation_id: &ObjectId) -> Result<Option<ConversationRef>> {
        Ok(Some(ConversationRef::bare(conversation_id)))
    }
}

#[async_trait]
impl SenderResolver for IdOnlyResolver {
    async fn resolve(&self, sender_id: &ObjectId) -> Result<Option<SenderRef>> {
        Ok(Some(SenderRef::bare(sender_id)))
    }
}
