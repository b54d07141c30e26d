use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::domain::model::{ConversationRef, SenderRef};
use crate::domain::repository::{ConversationResolver, SenderResolver};

/// 内存目录：登记会话名称与用户显示名，未登记的 id 解析为 `None`
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    conversations: Arc<RwLock<HashMap<ObjectId, String>>>,
    senders: Arc<RwLock<HashMap<ObjectId, String>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_conversation(&self, id: ObjectId, name: impl Into<String>) {
        self.conversations.write().await.insert(id, name.into());
    }

    pub async fn register_sender(&self, id: ObjectId, display_name: impl Into<String>) {
        self.senders.write().await.insert(id, display_name.into());
    }
}

#[async_trait]
impl ConversationResolver for InMemoryDirectory {
    async fn resolve(&self, conversation_id: &ObjectId) -> Result<Option<ConversationRef>> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(conversation_id).map(|name| ConversationRef {
            id: conversation_id.to_hex(),
            name: Some(name.clone()),
        }))
    }
}

#[async_trait]
impl SenderResolver for InMemoryDirectory {
    async fn resolve(&self, sender_id: &ObjectId) -> Result<Option<SenderRef>> {
        let senders = self.senders.read().await;
        Ok(senders.get(sender_id).map(|display_name| SenderRef {
            id: sender_id.to_hex(),
            display_name: Some(display_name.clone()),
        }))
    }
}
