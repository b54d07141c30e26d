//! 命令处理器（编排层）- 轻量级，只负责编排领域服务

use std::sync::Arc;

use tracing::instrument;

use crate::application::commands::{
    AddTagsCommand, CreateMessageCommand, DeleteMessageCommand, ReactionCommand,
    SetResolvedCommand, ToggleLikeCommand, UpdateTagsCommand,
};
use crate::domain::model::{CreateMessageInput, MessageView};
use crate::domain::service::MessageStore;
use crate::error::MessageStoreResult;

/// 消息存储命令处理器
pub struct MessageStoreCommandHandler {
    store: Arc<MessageStore>,
}

impl MessageStoreCommandHandler {
    pub fn new(store: Arc<MessageStore>) -> Self {
        Self { store }
    }

    /// 创建消息
    #[instrument(skip(self, command), fields(conversation_id = %command.conversation_id, sender_id = %command.sender_id))]
    pub async fn handle_create_message(
        &self,
        command: CreateMessageCommand,
    ) -> MessageStoreResult<MessageView> {
        let input = CreateMessageInput {
            conversation_id: command.conversation_id,
            text: command.text,
            tags: command.tags,
        };
        self.store.create(input, &command.sender_id).await
    }

    /// 软删除消息
    #[instrument(skip(self), fields(message_id = %command.message_id))]
    pub async fn handle_delete_message(
        &self,
        command: DeleteMessageCommand,
    ) -> MessageStoreResult<MessageView> {
        self.store.delete(&command.message_id).await
    }

    /// 追加标签
    #[instrument(skip(self), fields(message_id = %command.message_id))]
    pub async fn handle_add_tags(&self, command: AddTagsCommand) -> MessageStoreResult<MessageView> {
        self.store.add_tags(&command.message_id, command.tags).await
    }

    /// 替换标签
    #[instrument(skip(self), fields(message_id = %command.message_id))]
    pub async fn handle_update_tags(
        &self,
        command: UpdateTagsCommand,
    ) -> MessageStoreResult<MessageView> {
        self.store
            .update_tags(&command.message_id, command.tags)
            .await
    }

    #[instrument(skip(self), fields(message_id = %command.message_id, user_id = %command.user_id))]
    pub async fn handle_toggle_like(
        &self,
        command: ToggleLikeCommand,
    ) -> MessageStoreResult<MessageView> {
        if command.liked {
            self.store.like(&command.message_id, &command.user_id).await
        } else {
            self.store.unlike(&command.message_id, &command.user_id).await
        }
    }

    #[instrument(skip(self), fields(message_id = %command.message_id, user_id = %command.user_id))]
    pub async fn handle_reaction(&self, command: ReactionCommand) -> MessageStoreResult<MessageView> {
        if command.add {
            self.store
                .add_reaction(&command.message_id, &command.user_id, &command.emoji)
                .await
        } else {
            self.store
                .remove_reaction(&command.message_id, &command.user_id, &command.emoji)
                .await
        }
    }

    #[instrument(skip(self), fields(message_id = %command.message_id))]
    pub async fn handle_set_resolved(
        &self,
        command: SetResolvedCommand,
    ) -> MessageStoreResult<MessageView> {
        if command.resolved {
            self.store.resolve(&command.message_id).await
        } else {
            self.store.unresolve(&command.message_id).await
        }
    }
}
