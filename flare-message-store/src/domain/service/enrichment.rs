//! 输出增强：为消息附加会话与发送者引用

use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use tracing::{debug, warn};

use crate::domain::model::{ConversationRef, Message, MessageView, SenderRef};
use crate::domain::repository::{ConversationResolver, SenderResolver};

/// 引用解析失败不会让读取失败：解析出错或未命中时退化为仅含 id 的引用
pub struct ReferenceEnricher {
    conversations: Arc<dyn ConversationResolver>,
    senders: Arc<dyn SenderResolver>,
}

impl ReferenceEnricher {
    pub fn new(
        conversations: Arc<dyn ConversationResolver>,
        senders: Arc<dyn SenderResolver>,
    ) -> Self {
        Self {
            conversations,
            senders,
        }
    }

    pub async fn enrich(&self, message: Message) -> MessageView {
        let (conversation, sender) = tokio::join!(
            self.resolve_conversation(&message.conversation_id),
            self.resolve_sender(&message.sender_id),
        );
        MessageView::enriched(message, conversation, sender)
    }

    async fn resolve_conversation(&self, conversation_id: &ObjectId) -> ConversationRef {
        match self.conversations.resolve(conversation_id).await {
            // 输出中的 id 始终是存储 id 的十六进制形式
            Ok(Some(resolved)) => ConversationRef {
                id: conversation_id.to_hex(),
                ..resolved
            },
            Ok(None) => {
                debug!(conversation_id = %conversation_id, "conversation not resolved, using bare reference");
                ConversationRef::bare(conversation_id)
            }
            Err(err) => {
                warn!(error = ?err, conversation_id = %conversation_id, "Failed to resolve conversation");
                ConversationRef::bare(conversation_id)
            }
        }
    }

    async fn resolve_sender(&self, sender_id: &ObjectId) -> SenderRef {
        match self.senders.resolve(sender_id).await {
            Ok(Some(resolved)) => SenderRef {
                id: sender_id.to_hex(),
                ..resolved
            },
            Ok(None) => {
                debug!(sender_id = %sender_id, "sender not resolved, using bare reference");
                SenderRef::bare(sender_id)
            }
            Err(err) => {
                warn!(error = ?err, sender_id = %sender_id, "Failed to resolve sender");
                SenderRef::bare(sender_id)
            }
        }
    }
}
