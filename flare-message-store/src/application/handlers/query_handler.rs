//! 查询处理器（编排层）

use std::sync::Arc;

use tracing::instrument;

use crate::application::queries::{
    GetMessageQuery, GetMessagesByTagsQuery, ListMessagesQuery, ListTagsQuery,
};
use crate::domain::model::{ListMessagesOptions, MessageView};
use crate::domain::service::MessageStore;
use crate::error::MessageStoreResult;

/// 消息存储查询处理器
pub struct MessageStoreQueryHandler {
    store: Arc<MessageStore>,
}

impl MessageStoreQueryHandler {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    /// 获取单条消息
    #[instrument(skip(self), fields(message_id = %query.message_id))]
    pub async fn handle_get_message(&self, query: GetMessageQuery) -> MessageStoreResult<MessageView> {
        self.store.get_message(&query.message_id).await
    }

    /// 按标签查询消息
    #[instrument(skip(self), fields(tag_count = query.tags.len()))]
    pub async fn handle_get_messages_by_tags(
        &self,
        query: GetMessagesByTagsQuery,
    ) -> MessageStoreResult<Vec<MessageView>> {
        self.store.get_messages_by_tags(&query.tags).await
    }

    /// 会话消息列表
    #[instrument(skip(self), fields(conversation_id = %query.conversation_id))]
    pub async fn handle_list_messages(
        &self,
        query: ListMessagesQuery,
    ) -> MessageStoreResult<Vec<MessageView>> {
        let options = ListMessagesOptions {
            include_deleted: query.include_deleted,
            oldest_first: query.oldest_first,
            limit: query.limit,
            offset: query.offset,
        };
        self.store
            .list_messages(&query.conversation_id, options)
            .await
    }

    /// 列出所有标签
    #[instrument(skip(self, _query))]
    pub async fn handle_list_tags(&self, _query: ListTagsQuery) -> MessageStoreResult<Vec<String>> {
        self.store.list_tags().await
    }
}
