//! 存储文档结构与映射
//!
//! `MessageDocument` 是消息在集合中的存储形态（字段名为 camelCase，主键为 `_id`），
//! 领域实体与文档之间的转换、更新文档与查询条件的构造都集中在这里。

use chrono::{DateTime, Utc};
use flare_chat_core::utils::millis_to_datetime;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::model::{Message, MessageChange, MessageFilter, Reaction, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub conversation_id: ObjectId,
    pub sender_id: ObjectId,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    #[serde(default)]
    pub reactions: Vec<ReactionDocument>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionDocument {
    pub emoji: String,
    pub user_id: ObjectId,
}

impl From<&Reaction> for ReactionDocument {
    fn from(reaction: &Reaction) -> Self {
        Self {
            emoji: reaction.emoji.clone(),
            user_id: reaction.user_id,
        }
    }
}

impl From<ReactionDocument> for Reaction {
    fn from(document: ReactionDocument) -> Self {
        Self {
            emoji: document.emoji,
            user_id: document.user_id,
        }
    }
}

impl From<&Message> for MessageDocument {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            text: message.text.clone(),
            tags: message.tags.clone(),
            likes: message.likes.clone(),
            reactions: message.reactions.iter().map(ReactionDocument::from).collect(),
            resolved: message.resolved,
            deleted: message.deleted,
            created_at: to_bson_datetime(message.created_at),
            updated_at: to_bson_datetime(message.updated_at),
        }
    }
}

impl From<MessageDocument> for Message {
    fn from(document: MessageDocument) -> Self {
        Self {
            id: document.id,
            conversation_id: document.conversation_id,
            sender_id: document.sender_id,
            text: document.text,
            tags: document.tags,
            likes: document.likes,
            reactions: document.reactions.into_iter().map(Reaction::from).collect(),
            resolved: document.resolved,
            deleted: document.deleted,
            created_at: from_bson_datetime(document.created_at),
            updated_at: from_bson_datetime(document.updated_at),
        }
    }
}

impl MessageDocument {
    /// 在内存中应用变更，语义与 `update_document` 生成的更新操作一致
    pub fn apply(&mut self, change: &MessageChange, now: bson::DateTime) {
        match change {
            MessageChange::MarkDeleted => self.deleted = true,
            MessageChange::AppendTags(tags) => self.tags.extend(tags.iter().cloned()),
            MessageChange::ReplaceTags(tags) => self.tags = tags.clone(),
            MessageChange::AddLike(user_id) => {
                if !self.likes.contains(user_id) {
                    self.likes.push(*user_id);
                }
            }
            MessageChange::RemoveLike(user_id) => self.likes.retain(|like| like != user_id),
            MessageChange::AddReaction(reaction) => {
                let reaction = ReactionDocument::from(reaction);
                if !self.reactions.contains(&reaction) {
                    self.reactions.push(reaction);
                }
            }
            MessageChange::RemoveReaction(reaction) => {
                let reaction = ReactionDocument::from(reaction);
                self.reactions.retain(|existing| existing != &reaction);
            }
            MessageChange::SetResolved(resolved) => self.resolved = *resolved,
        }
        self.updated_at = now;
    }

    /// 在内存中判断文档是否满足查询条件，语义与 `filter_document` 一致
    pub fn matches(&self, filter: &MessageFilter) -> bool {
        if !filter.include_deleted && self.deleted {
            return false;
        }
        if let Some(conversation_id) = &filter.conversation_id {
            if &self.conversation_id != conversation_id {
                return false;
            }
        }
        if let Some(tags) = &filter.any_tags {
            if !tags.iter().any(|tag| self.tags.contains(tag)) {
                return false;
            }
        }
        true
    }

    /// 排序键：createdAt，再按 id
    pub fn creation_key(&self) -> (i64, [u8; 12]) {
        (self.created_at.timestamp_millis(), self.id.bytes())
    }
}

/// 按 id 匹配的条件文档，`require_active` 时附加未删除条件
pub fn id_filter(id: &ObjectId, require_active: bool) -> Document {
    let mut filter = doc! { "_id": *id };
    if require_active {
        filter.insert("deleted", false);
    }
    filter
}

/// 生成字段级原子更新文档，并始终刷新 updatedAt
pub fn update_document(change: &MessageChange, now: bson::DateTime) -> Document {
    let mut set = doc! { "updatedAt": now };
    let mut update = Document::new();

    match change {
        MessageChange::MarkDeleted => {
            set.insert("deleted", true);
        }
        MessageChange::ReplaceTags(tags) => {
            set.insert("tags", tags.clone());
        }
        MessageChange::SetResolved(resolved) => {
            set.insert("resolved", *resolved);
        }
        MessageChange::AppendTags(tags) => {
            update.insert("$push", doc! { "tags": { "$each": tags.clone() } });
        }
        MessageChange::AddLike(user_id) => {
            update.insert("$addToSet", doc! { "likes": *user_id });
        }
        MessageChange::RemoveLike(user_id) => {
            update.insert("$pull", doc! { "likes": *user_id });
        }
        MessageChange::AddReaction(reaction) => {
            update.insert("$addToSet", doc! { "reactions": reaction_document(reaction) });
        }
        MessageChange::RemoveReaction(reaction) => {
            update.insert("$pull", doc! { "reactions": reaction_document(reaction) });
        }
    }

    update.insert("$set", set);
    update
}

/// 生成查询条件文档
pub fn filter_document(filter: &MessageFilter) -> Document {
    let mut query = Document::new();
    if let Some(conversation_id) = filter.conversation_id {
        query.insert("conversationId", conversation_id);
    }
    if let Some(tags) = &filter.any_tags {
        query.insert("tags", doc! { "$in": tags.clone() });
    }
    if !filter.include_deleted {
        query.insert("deleted", false);
    }
    query
}

pub fn sort_document(order: SortOrder) -> Document {
    let direction = match order {
        SortOrder::Ascending => 1,
        SortOrder::Descending => -1,
    };
    doc! { "createdAt": direction, "_id": direction }
}

fn reaction_document(reaction: &Reaction) -> Document {
    doc! { "emoji": reaction.emoji.clone(), "userId": reaction.user_id }
}

fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

/// 超出 chrono 可表示范围的时间戳记录告警后按纪元时间处理
fn from_bson_datetime(value: bson::DateTime) -> DateTime<Utc> {
    let millis = value.timestamp_millis();
    millis_to_datetime(millis).unwrap_or_else(|| {
        warn!(millis, "stored timestamp out of range, using epoch");
        DateTime::<Utc>::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flare_chat_core::utils::now_millis_precision;

    fn sample_message() -> Message {
        let mut message = Message::new(
            ObjectId::new(),
            ObjectId::new(),
            "Hello world".to_string(),
            vec!["tag1".to_string(), "tag1".to_string()],
            now_millis_precision(),
        );
        message.likes.push(ObjectId::new());
        message.reactions.push(Reaction {
            emoji: "🎉".to_string(),
            user_id: ObjectId::new(),
        });
        message
    }

    #[test]
    fn test_document_mapping_preserves_entity() {
        let message = sample_message();
        let document = MessageDocument::from(&message);

        let raw = bson::to_document(&document).unwrap();
        assert_eq!(raw.get_object_id("_id").unwrap(), message.id);
        assert_eq!(
            raw.get_object_id("conversationId").unwrap(),
            message.conversation_id
        );
        assert!(raw.contains_key("createdAt"));
        assert!(!raw.contains_key("likesCount"));

        let decoded: MessageDocument = bson::from_document(raw).unwrap();
        assert_eq!(Message::from(decoded), message);
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let now = bson::DateTime::now();
        let raw = doc! {
            "_id": ObjectId::new(),
            "conversationId": ObjectId::new(),
            "senderId": ObjectId::new(),
            "text": "legacy",
            "createdAt": now,
            "updatedAt": now,
        };
        let document: MessageDocument = bson::from_document(raw).unwrap();
        assert!(document.tags.is_empty());
        assert!(document.likes.is_empty());
        assert!(!document.deleted);
        assert!(!document.resolved);
    }

    #[test]
    fn test_out_of_range_timestamp_maps_to_epoch() {
        let converted = from_bson_datetime(bson::DateTime::from_millis(i64::MAX));
        assert_eq!(converted, DateTime::<Utc>::default());

        let now = now_millis_precision();
        assert_eq!(from_bson_datetime(to_bson_datetime(now)), now);
    }

    #[test]
    fn test_update_document_operators() {
        let now = bson::DateTime::now();

        let append = update_document(&MessageChange::AppendTags(vec!["a".into()]), now);
        assert!(append.get_document("$push").unwrap().contains_key("tags"));
        assert_eq!(
            append.get_document("$set").unwrap().get_datetime("updatedAt").unwrap(),
            &now
        );

        let delete = update_document(&MessageChange::MarkDeleted, now);
        assert!(delete.get_document("$set").unwrap().get_bool("deleted").unwrap());
        assert!(!delete.contains_key("$push"));

        let like = update_document(&MessageChange::AddLike(ObjectId::new()), now);
        assert!(like.contains_key("$addToSet"));

        let unlike = update_document(&MessageChange::RemoveLike(ObjectId::new()), now);
        assert!(unlike.contains_key("$pull"));
    }

    #[test]
    fn test_filter_document_uses_in_for_tags() {
        let filter = MessageFilter {
            any_tags: Some(vec!["tag1".into(), "tag2".into()]),
            include_deleted: false,
            ..MessageFilter::default()
        };
        let query = filter_document(&filter);
        let tags = query.get_document("tags").unwrap();
        assert_eq!(tags.get_array("$in").unwrap().len(), 2);
        assert!(!query.get_bool("deleted").unwrap());

        let all = filter_document(&MessageFilter {
            include_deleted: true,
            ..MessageFilter::default()
        });
        assert!(all.is_empty());
    }

    #[test]
    fn test_apply_matches_set_semantics() {
        let message = sample_message();
        let mut document = MessageDocument::from(&message);
        let liker = message.likes[0];
        let now = bson::DateTime::now();

        document.apply(&MessageChange::AddLike(liker), now);
        assert_eq!(document.likes.len(), 1);

        document.apply(&MessageChange::AppendTags(vec!["tag1".into()]), now);
        assert_eq!(document.tags, vec!["tag1", "tag1", "tag1"]);

        document.apply(&MessageChange::RemoveLike(liker), now);
        assert!(document.likes.is_empty());
        assert_eq!(document.updated_at, now);
    }

    #[test]
    fn test_matches_any_tag() {
        let document = MessageDocument::from(&sample_message());
        let hit = MessageFilter {
            any_tags: Some(vec!["other".into(), "tag1".into()]),
            ..MessageFilter::default()
        };
        let miss = MessageFilter {
            any_tags: Some(vec!["other".into()]),
            ..MessageFilter::default()
        };
        assert!(document.matches(&hit));
        assert!(!document.matches(&miss));
    }
}
