//! 领域模型定义
//!
//! 实体与值对象均为纯数据结构，不携带任何存储层注解；
//! 与存储文档之间的转换由 `infrastructure::persistence::document` 负责。

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

/// 消息实体
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: ObjectId,
    pub conversation_id: ObjectId,
    pub sender_id: ObjectId,
    pub text: String,
    /// 有序标签序列，允许重复
    pub tags: Vec<String>,
    /// 点赞用户集合（保持插入顺序，元素唯一）
    pub likes: Vec<ObjectId>,
    pub reactions: Vec<Reaction>,
    pub resolved: bool,
    /// 软删除标记，一旦为 true 不再回退
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// 构造一条新消息，除标签外的可变字段均取默认值
    pub fn new(
        conversation_id: ObjectId,
        sender_id: ObjectId,
        text: String,
        tags: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            conversation_id,
            sender_id,
            text,
            tags,
            likes: Vec::new(),
            reactions: Vec::new(),
            resolved: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 点赞数，始终由 likes 推导
    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

/// 表情回应记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    #[serde(serialize_with = "object_id_hex::serialize")]
    pub user_id: ObjectId,
}

/// 创建消息的输入（来自请求负载，发送者由调用方的认证上下文单独提供）
#[derive(Debug, Clone, Default)]
pub struct CreateMessageInput {
    pub conversation_id: String,
    pub text: String,
    pub tags: Option<Vec<String>>,
}

/// 单个字段级变更，由存储层以原子方式应用
#[derive(Debug, Clone, PartialEq)]
pub enum MessageChange {
    MarkDeleted,
    AppendTags(Vec<String>),
    ReplaceTags(Vec<String>),
    AddLike(ObjectId),
    RemoveLike(ObjectId),
    AddReaction(Reaction),
    RemoveReaction(Reaction),
    SetResolved(bool),
}

/// 消息更新结构
#[derive(Debug, Clone, PartialEq)]
pub struct MessageUpdate {
    pub change: MessageChange,
    /// 为 true 时仅匹配未删除的消息（条件与变更在同一次原子操作中生效）
    pub require_active: bool,
}

impl MessageUpdate {
    /// 仅作用于未删除消息的变更
    pub fn active_only(change: MessageChange) -> Self {
        Self {
            change,
            require_active: true,
        }
    }

    /// 不区分删除状态的变更
    pub fn unconditional(change: MessageChange) -> Self {
        Self {
            change,
            require_active: false,
        }
    }
}

/// 排序方向（按 createdAt，再按 id）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// 消息查询条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageFilter {
    pub conversation_id: Option<ObjectId>,
    /// 命中任意一个标签即匹配（OR 语义）
    pub any_tags: Option<Vec<String>>,
    pub include_deleted: bool,
    pub sort: SortOrder,
    pub offset: u64,
    pub limit: Option<i64>,
}

/// 会话消息列表选项
#[derive(Debug, Clone, Default)]
pub struct ListMessagesOptions {
    /// 是否包含已软删除的消息（默认不包含）
    pub include_deleted: bool,
    /// 为 true 时由旧到新，默认由新到旧
    pub oldest_first: bool,
    pub limit: Option<i64>,
    pub offset: u64,
}

/// 会话引用（输出时解析）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConversationRef {
    pub fn bare(id: &ObjectId) -> Self {
        Self {
            id: id.to_hex(),
            name: None,
        }
    }
}

/// 发送者引用（输出时解析）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SenderRef {
    pub fn bare(id: &ObjectId) -> Self {
        Self {
            id: id.to_hex(),
            display_name: None,
        }
    }
}

/// 消息输出表示
///
/// `likes_count` 在构造时由 `likes` 计算；`conversation` / `sender` 仅在
/// 单条消息读取路径上填充。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(serialize_with = "object_id_hex::serialize")]
    pub id: ObjectId,
    #[serde(serialize_with = "object_id_hex::serialize")]
    pub conversation_id: ObjectId,
    #[serde(serialize_with = "object_id_hex::serialize")]
    pub sender_id: ObjectId,
    pub text: String,
    pub tags: Vec<String>,
    #[serde(serialize_with = "object_id_hex::serialize_all")]
    pub likes: Vec<ObjectId>,
    pub likes_count: usize,
    pub reactions: Vec<Reaction>,
    pub resolved: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<SenderRef>,
}

impl MessageView {
    pub fn enriched(message: Message, conversation: ConversationRef, sender: SenderRef) -> Self {
        let mut view = Self::from(message);
        view.conversation = Some(conversation);
        view.sender = Some(sender);
        view
    }
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        let likes_count = message.likes_count();
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            text: message.text,
            tags: message.tags,
            likes: message.likes,
            likes_count,
            reactions: message.reactions,
            resolved: message.resolved,
            deleted: message.deleted,
            created_at: message.created_at,
            updated_at: message.updated_at,
            conversation: None,
            sender: None,
        }
    }
}

/// ObjectId 在输出表示中统一序列化为十六进制字符串
mod object_id_hex {
    use mongodb::bson::oid::ObjectId;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_hex())
    }

    pub fn serialize_all<S: Serializer>(
        ids: &[ObjectId],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(ids.iter().map(|id| id.to_hex()))
    }
}
