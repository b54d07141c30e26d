//! 内存版消息集合
//!
//! 以存储文档形态保存消息，用于开发、测试以及未配置 MongoDB 的部署。
//! 所有写操作在同一把写锁内完成条件判断与字段变更，保证单文档更新的原子性。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use mongodb::bson::{self, oid::ObjectId};
use tokio::sync::RwLock;

use super::document::MessageDocument;
use crate::domain::model::{Message, MessageFilter, MessageUpdate, SortOrder};
use crate::domain::repository::MessageRepository;

#[derive(Default, Clone)]
pub struct InMemoryMessageRepository {
    documents: Arc<RwLock<HashMap<ObjectId, MessageDocument>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> Result<ObjectId> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&message.id) {
            return Err(anyhow!("duplicate key: message {} already exists", message.id));
        }
        documents.insert(message.id, MessageDocument::from(message));
        Ok(message.id)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Message>> {
        let documents = self.documents.read().await;
        Ok(documents.get(id).cloned().map(Message::from))
    }

    async fn find_where(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        let documents = self.documents.read().await;

        let mut matched: Vec<&MessageDocument> = documents
            .values()
            .filter(|document| document.matches(filter))
            .collect();

        matched.sort_by_key(|document| document.creation_key());
        if filter.sort == SortOrder::Descending {
            matched.reverse();
        }

        let limit = filter
            .limit
            .map(|limit| limit.max(0) as usize)
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(filter.offset as usize)
            .take(limit)
            .cloned()
            .map(Message::from)
            .collect())
    }

    async fn update_by_id(&self, id: &ObjectId, update: &MessageUpdate) -> Result<Option<Message>> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(id) else {
            return Ok(None);
        };
        if update.require_active && document.deleted {
            return Ok(None);
        }

        document.apply(&update.change, bson::DateTime::now());
        Ok(Some(Message::from(document.clone())))
    }

    async fn distinct_tags(&self) -> Result<Vec<String>> {
        let documents = self.documents.read().await;
        let tags: HashSet<&String> = documents
            .values()
            .flat_map(|document| document.tags.iter())
            .collect();
        Ok(tags.into_iter().cloned().collect())
    }

    async fn purge(&self) -> Result<u64> {
        let mut documents = self.documents.write().await;
        let removed = documents.len() as u64;
        documents.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MessageChange;
    use flare_chat_core::utils::now_millis_precision;

    fn message_with_tags(conversation_id: ObjectId, tags: &[&str]) -> Message {
        Message::new(
            conversation_id,
            ObjectId::new(),
            "text".to_string(),
            tags.iter().map(|tag| tag.to_string()).collect(),
            now_millis_precision(),
        )
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let repo = InMemoryMessageRepository::new();
        let message = message_with_tags(ObjectId::new(), &[]);

        repo.insert(&message).await.unwrap();
        assert!(repo.insert(&message).await.is_err());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_guarded_update_skips_deleted_document() {
        let repo = InMemoryMessageRepository::new();
        let message = message_with_tags(ObjectId::new(), &["a"]);
        repo.insert(&message).await.unwrap();

        repo.update_by_id(&message.id, &MessageUpdate::unconditional(MessageChange::MarkDeleted))
            .await
            .unwrap()
            .unwrap();

        let guarded = repo
            .update_by_id(
                &message.id,
                &MessageUpdate::active_only(MessageChange::AppendTags(vec!["b".into()])),
            )
            .await
            .unwrap();
        assert!(guarded.is_none());

        let stored = repo.find_by_id(&message.id).await.unwrap().unwrap();
        assert_eq!(stored.tags, vec!["a"]);
        assert!(stored.deleted);
    }

    #[tokio::test]
    async fn test_find_where_orders_and_paginates() {
        let repo = InMemoryMessageRepository::new();
        let conversation_id = ObjectId::new();

        let mut ids = Vec::new();
        for _ in 0..4 {
            let message = message_with_tags(conversation_id, &[]);
            ids.push(message.id);
            repo.insert(&message).await.unwrap();
        }
        repo.insert(&message_with_tags(ObjectId::new(), &[]))
            .await
            .unwrap();

        let newest_first = repo
            .find_where(&MessageFilter {
                conversation_id: Some(conversation_id),
                sort: SortOrder::Descending,
                offset: 1,
                limit: Some(2),
                ..MessageFilter::default()
            })
            .await
            .unwrap();

        let got: Vec<ObjectId> = newest_first.iter().map(|m| m.id).collect();
        assert_eq!(got, vec![ids[2], ids[1]]);
    }

    #[tokio::test]
    async fn test_purge_clears_collection() {
        let repo = InMemoryMessageRepository::new();
        repo.insert(&message_with_tags(ObjectId::new(), &["x"]))
            .await
            .unwrap();

        assert_eq!(repo.purge().await.unwrap(), 1);
        assert!(repo.is_empty().await);
        assert!(repo.distinct_tags().await.unwrap().is_empty());
    }
}
