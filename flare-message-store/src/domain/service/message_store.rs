//! 消息存储领域服务 - 包含消息生命周期的全部业务规则

use std::sync::Arc;

use flare_chat_core::utils::now_millis_precision;
use mongodb::bson::oid::ObjectId;
use tracing::{debug, info, instrument};

use super::enrichment::ReferenceEnricher;
use crate::domain::model::{
    CreateMessageInput, ListMessagesOptions, Message, MessageChange, MessageFilter, MessageUpdate,
    MessageView, Reaction, SortOrder,
};
use crate::domain::repository::{ConversationResolver, MessageRepository, SenderResolver};
use crate::error::{MessageStoreError, MessageStoreResult};

/// 领域服务配置（值对象，不依赖基础设施层）
#[derive(Debug, Clone)]
pub struct MessageStoreDomainConfig {
    pub max_page_size: i64,
    /// 写入标签的最大字符数，`None` 表示不限制
    pub max_tag_length: Option<usize>,
}

impl Default for MessageStoreDomainConfig {
    fn default() -> Self {
        Self {
            max_page_size: 200,
            max_tag_length: None,
        }
    }
}

/// 消息存储 - 消息创建、读取、软删除、标签与查询的唯一入口
///
/// 所有依赖通过构造函数显式注入。服务本身不持有任何可变状态，
/// 每次调用都直接读写消息集合。
pub struct MessageStore {
    repository: Arc<dyn MessageRepository>,
    enricher: ReferenceEnricher,
    config: MessageStoreDomainConfig,
}

impl MessageStore {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        conversations: Arc<dyn ConversationResolver>,
        senders: Arc<dyn SenderResolver>,
        config: MessageStoreDomainConfig,
    ) -> Self {
        Self {
            repository,
            enricher: ReferenceEnricher::new(conversations, senders),
            config,
        }
    }

    pub fn config(&self) -> &MessageStoreDomainConfig {
        &self.config
    }

    /// 创建消息
    ///
    /// # 参数
    /// * `input` - 会话 id、正文与可选标签
    /// * `sender_id` - 发送者 id，来自调用方的认证上下文
    #[instrument(skip(self, input), fields(sender_id = %sender_id))]
    pub async fn create(
        &self,
        input: CreateMessageInput,
        sender_id: &str,
    ) -> MessageStoreResult<MessageView> {
        let conversation_id = parse_object_id("conversationId", &input.conversation_id)?;
        let sender_id = parse_object_id("senderId", sender_id)?;
        if input.text.is_empty() {
            return Err(MessageStoreError::validation("text must not be empty"));
        }
        let tags = input.tags.unwrap_or_default();
        self.validate_tags(&tags)?;

        let message = Message::new(
            conversation_id,
            sender_id,
            input.text,
            tags,
            now_millis_precision(),
        );
        self.repository
            .insert(&message)
            .await
            .map_err(MessageStoreError::Persistence)?;

        info!(message_id = %message.id, conversation_id = %conversation_id, "message created");
        Ok(self.enricher.enrich(message).await)
    }

    /// 按 id 获取消息（包含已软删除的消息）
    #[instrument(skip(self))]
    pub async fn get_message(&self, id: &str) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        let message = self
            .repository
            .find_by_id(&id)
            .await
            .map_err(MessageStoreError::Persistence)?
            .ok_or_else(|| MessageStoreError::NotFound(id.to_hex()))?;
        Ok(self.enricher.enrich(message).await)
    }

    /// 软删除消息，重复删除不会失败
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        let message = self
            .repository
            .update_by_id(&id, &MessageUpdate::unconditional(MessageChange::MarkDeleted))
            .await
            .map_err(MessageStoreError::Persistence)?
            .ok_or_else(|| MessageStoreError::NotFound(id.to_hex()))?;

        info!(message_id = %id, "message marked as deleted");
        Ok(self.enricher.enrich(message).await)
    }

    /// 追加标签（保留原有顺序，不去重）
    #[instrument(skip(self), fields(tag_count = tags.len()))]
    pub async fn add_tags(&self, id: &str, tags: Vec<String>) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        self.validate_tags(&tags)?;
        self.mutate_active(&id, MessageChange::AppendTags(tags)).await
    }

    /// 整体替换标签
    #[instrument(skip(self), fields(tag_count = tags.len()))]
    pub async fn update_tags(
        &self,
        id: &str,
        tags: Vec<String>,
    ) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        self.validate_tags(&tags)?;
        self.mutate_active(&id, MessageChange::ReplaceTags(tags)).await
    }

    /// 查询包含任意一个给定标签的消息，按创建顺序返回，每条消息至多出现一次
    #[instrument(skip(self), fields(tag_count = tags.len()))]
    pub async fn get_messages_by_tags(&self, tags: &[String]) -> MessageStoreResult<Vec<MessageView>> {
        if tags.is_empty() {
            return Err(MessageStoreError::validation("at least one tag is required"));
        }
        // 查询标签只校验非空，长度限制只作用于写入
        reject_empty_tags(tags)?;

        let filter = MessageFilter {
            any_tags: Some(tags.to_vec()),
            include_deleted: true,
            sort: SortOrder::Ascending,
            ..MessageFilter::default()
        };
        let messages = self
            .repository
            .find_where(&filter)
            .await
            .map_err(MessageStoreError::Persistence)?;

        debug!(matched = messages.len(), "messages found by tags");
        Ok(messages.into_iter().map(MessageView::from).collect())
    }

    /// 点赞（集合语义，重复点赞无效果）
    #[instrument(skip(self))]
    pub async fn like(&self, id: &str, user_id: &str) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        let user_id = parse_object_id("userId", user_id)?;
        self.mutate_active(&id, MessageChange::AddLike(user_id)).await
    }

    /// 取消点赞
    #[instrument(skip(self))]
    pub async fn unlike(&self, id: &str, user_id: &str) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        let user_id = parse_object_id("userId", user_id)?;
        self.mutate_active(&id, MessageChange::RemoveLike(user_id)).await
    }

    /// 添加表情回应，同一用户的同一表情只记录一次
    #[instrument(skip(self))]
    pub async fn add_reaction(
        &self,
        id: &str,
        user_id: &str,
        emoji: &str,
    ) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        let reaction = build_reaction(user_id, emoji)?;
        self.mutate_active(&id, MessageChange::AddReaction(reaction)).await
    }

    /// 移除表情回应
    #[instrument(skip(self))]
    pub async fn remove_reaction(
        &self,
        id: &str,
        user_id: &str,
        emoji: &str,
    ) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        let reaction = build_reaction(user_id, emoji)?;
        self.mutate_active(&id, MessageChange::RemoveReaction(reaction))
            .await
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, id: &str) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        self.mutate_active(&id, MessageChange::SetResolved(true)).await
    }

    #[instrument(skip(self))]
    pub async fn unresolve(&self, id: &str) -> MessageStoreResult<MessageView> {
        let id = parse_object_id("id", id)?;
        self.mutate_active(&id, MessageChange::SetResolved(false)).await
    }

    /// 会话消息列表（默认不含已删除消息，由新到旧）
    #[instrument(skip(self, options), fields(conversation_id = %conversation_id))]
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        options: ListMessagesOptions,
    ) -> MessageStoreResult<Vec<MessageView>> {
        let conversation_id = parse_object_id("conversationId", conversation_id)?;
        let limit = options
            .limit
            .unwrap_or(self.config.max_page_size)
            .clamp(1, self.config.max_page_size);

        let filter = MessageFilter {
            conversation_id: Some(conversation_id),
            any_tags: None,
            include_deleted: options.include_deleted,
            sort: if options.oldest_first {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            },
            offset: options.offset,
            limit: Some(limit),
        };
        let messages = self
            .repository
            .find_where(&filter)
            .await
            .map_err(MessageStoreError::Persistence)?;

        Ok(messages.into_iter().map(MessageView::from).collect())
    }

    /// 所有已使用的标签（去重并按字典序排序）
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> MessageStoreResult<Vec<String>> {
        let mut tags = self
            .repository
            .distinct_tags()
            .await
            .map_err(MessageStoreError::Persistence)?;
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    /// 物理清空消息集合，仅用于维护和测试
    #[instrument(skip(self))]
    pub async fn purge(&self) -> MessageStoreResult<u64> {
        let removed = self
            .repository
            .purge()
            .await
            .map_err(MessageStoreError::Persistence)?;
        info!(removed, "message collection purged");
        Ok(removed)
    }

    /// 对未删除的消息应用变更；条件不满足时区分“不存在”与“已删除”
    async fn mutate_active(
        &self,
        id: &ObjectId,
        change: MessageChange,
    ) -> MessageStoreResult<MessageView> {
        let updated = self
            .repository
            .update_by_id(id, &MessageUpdate::active_only(change))
            .await
            .map_err(MessageStoreError::Persistence)?;

        match updated {
            Some(message) => Ok(self.enricher.enrich(message).await),
            None => Err(self.classify_unmatched(id).await),
        }
    }

    async fn classify_unmatched(&self, id: &ObjectId) -> MessageStoreError {
        match self.repository.find_by_id(id).await {
            Ok(Some(message)) if message.deleted => {
                debug!(message_id = %id, "mutation rejected on deleted message");
                MessageStoreError::Deleted(id.to_hex())
            }
            Ok(_) => MessageStoreError::NotFound(id.to_hex()),
            Err(err) => MessageStoreError::Persistence(err),
        }
    }

    fn validate_tags(&self, tags: &[String]) -> MessageStoreResult<()> {
        reject_empty_tags(tags)?;
        if let Some(max_tag_length) = self.config.max_tag_length {
            if let Some(tag) = tags.iter().find(|tag| tag.chars().count() > max_tag_length) {
                return Err(MessageStoreError::validation(format!(
                    "tag '{tag}' exceeds {max_tag_length} characters"
                )));
            }
        }
        Ok(())
    }
}

fn reject_empty_tags(tags: &[String]) -> MessageStoreResult<()> {
    if tags.iter().any(String::is_empty) {
        return Err(MessageStoreError::validation("tags must not be empty"));
    }
    Ok(())
}

fn parse_object_id(field: &str, raw: &str) -> MessageStoreResult<ObjectId> {
    if raw.is_empty() {
        return Err(MessageStoreError::validation(format!("{field} is required")));
    }
    ObjectId::parse_str(raw)
        .map_err(|_| MessageStoreError::validation(format!("{field} is not a valid id: {raw}")))
}

fn build_reaction(user_id: &str, emoji: &str) -> MessageStoreResult<Reaction> {
    let user_id = parse_object_id("userId", user_id)?;
    if emoji.is_empty() {
        return Err(MessageStoreError::validation("emoji must not be empty"));
    }
    Ok(Reaction {
        emoji: emoji.to_string(),
        user_id,
    })
}
