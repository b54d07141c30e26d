//! 仓储接口定义（Port）

use anyhow::Result;
use mongodb::bson::oid::ObjectId;

use crate::domain::model::{
    ConversationRef, Message, MessageFilter, MessageUpdate, SenderRef,
};

/// 消息文档集合
///
/// 实现方负责单文档更新的原子性：`update_by_id` 的匹配条件与字段变更
/// 必须在同一次存储操作中完成，调用方不做读-改-写。
#[async_trait::async_trait]
pub trait MessageRepository: Send + Sync {
    /// 插入新消息，返回其 id
    async fn insert(&self, message: &Message) -> Result<ObjectId>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Message>>;

    async fn find_where(&self, filter: &MessageFilter) -> Result<Vec<Message>>;

    /// 原子地应用字段级变更，返回变更后的消息
    ///
    /// # 返回
    /// * `Ok(None)` - 没有满足条件的文档（不存在，或 `require_active` 时已删除）
    async fn update_by_id(&self, id: &ObjectId, update: &MessageUpdate) -> Result<Option<Message>>;

    /// 所有消息中出现过的标签（去重）
    async fn distinct_tags(&self) -> Result<Vec<String>>;

    /// 物理删除全部消息，仅用于维护和测试
    async fn purge(&self) -> Result<u64>;
}

/// 会话引用解析器
#[async_trait::async_trait]
pub trait ConversationResolver: Send + Sync {
    async fn resolve(&self, conversation_id: &ObjectId) -> Result<Option<ConversationRef>>;
}

/// 发送者引用解析器
#[async_trait::async_trait]
pub trait SenderResolver: Send + Sync {
    async fn resolve(&self, sender_id: &ObjectId) -> Result<Option<SenderRef>>;
}
