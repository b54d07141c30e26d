use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use super::{MessageStoreCommandHandler, MessageStoreQueryHandler};
use crate::application::commands::{
    AddTagsCommand, CreateMessageCommand, DeleteMessageCommand, ReactionCommand,
    SetResolvedCommand, ToggleLikeCommand, UpdateTagsCommand,
};
use crate::application::queries::{
    GetMessageQuery, GetMessagesByTagsQuery, ListMessagesQuery, ListTagsQuery,
};
use crate::domain::service::{MessageStore, MessageStoreDomainConfig};
use crate::error::MessageStoreError;
use crate::infrastructure::persistence::InMemoryMessageRepository;
use crate::infrastructure::resolver::IdOnlyResolver;

fn handlers() -> (MessageStoreCommandHandler, MessageStoreQueryHandler) {
    let resolver = Arc::new(IdOnlyResolver);
    let store = Arc::new(MessageStore::new(
        Arc::new(InMemoryMessageRepository::new()),
        resolver.clone(),
        resolver,
        MessageStoreDomainConfig::default(),
    ));
    (
        MessageStoreCommandHandler::new(store.clone()),
        MessageStoreQueryHandler::new(store),
    )
}

async fn create(
    commands: &MessageStoreCommandHandler,
    conversation_id: &str,
    tags: &[&str],
) -> String {
    commands
        .handle_create_message(CreateMessageCommand {
            conversation_id: conversation_id.to_string(),
            sender_id: ObjectId::new().to_hex(),
            text: "handled".to_string(),
            tags: Some(tags.iter().map(|tag| tag.to_string()).collect()),
        })
        .await
        .unwrap()
        .id
        .to_hex()
}

#[tokio::test]
async fn test_tag_commands_and_queries() {
    let (commands, queries) = handlers();
    let conversation_id = ObjectId::new().to_hex();
    let message_id = create(&commands, &conversation_id, &["alpha"]).await;

    let added = commands
        .handle_add_tags(AddTagsCommand {
            message_id: message_id.clone(),
            tags: vec!["beta".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(added.tags, vec!["alpha", "beta"]);

    let replaced = commands
        .handle_update_tags(UpdateTagsCommand {
            message_id: message_id.clone(),
            tags: vec!["gamma".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(replaced.tags, vec!["gamma"]);

    let found = queries
        .handle_get_messages_by_tags(GetMessagesByTagsQuery {
            tags: vec!["gamma".to_string(), "alpha".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let tags = queries.handle_list_tags(ListTagsQuery::default()).await.unwrap();
    assert_eq!(tags, vec!["gamma"]);
}

#[tokio::test]
async fn test_toggle_commands() {
    let (commands, queries) = handlers();
    let message_id = create(&commands, &ObjectId::new().to_hex(), &[]).await;
    let user_id = ObjectId::new().to_hex();

    let liked = commands
        .handle_toggle_like(ToggleLikeCommand {
            message_id: message_id.clone(),
            user_id: user_id.clone(),
            liked: true,
        })
        .await
        .unwrap();
    assert_eq!(liked.likes_count, 1);

    let unliked = commands
        .handle_toggle_like(ToggleLikeCommand {
            message_id: message_id.clone(),
            user_id: user_id.clone(),
            liked: false,
        })
        .await
        .unwrap();
    assert_eq!(unliked.likes_count, 0);

    let reacted = commands
        .handle_reaction(ReactionCommand {
            message_id: message_id.clone(),
            user_id: user_id.clone(),
            emoji: "🎉".to_string(),
            add: true,
        })
        .await
        .unwrap();
    assert_eq!(reacted.reactions.len(), 1);

    let unreacted = commands
        .handle_reaction(ReactionCommand {
            message_id: message_id.clone(),
            user_id,
            emoji: "🎉".to_string(),
            add: false,
        })
        .await
        .unwrap();
    assert!(unreacted.reactions.is_empty());

    let resolved = commands
        .handle_set_resolved(SetResolvedCommand {
            message_id: message_id.clone(),
            resolved: true,
        })
        .await
        .unwrap();
    assert!(resolved.resolved);

    commands
        .handle_set_resolved(SetResolvedCommand {
            message_id: message_id.clone(),
            resolved: false,
        })
        .await
        .unwrap();

    let fetched = queries
        .handle_get_message(GetMessageQuery { message_id })
        .await
        .unwrap();
    assert!(!fetched.resolved);
    assert!(fetched.likes.is_empty());
}

#[tokio::test]
async fn test_delete_and_list_messages() {
    let (commands, queries) = handlers();
    let conversation_id = ObjectId::new().to_hex();
    let first = create(&commands, &conversation_id, &[]).await;
    let second = create(&commands, &conversation_id, &[]).await;

    let deleted = commands
        .handle_delete_message(DeleteMessageCommand {
            message_id: first.clone(),
        })
        .await
        .unwrap();
    assert!(deleted.deleted);

    let visible = queries
        .handle_list_messages(ListMessagesQuery {
            conversation_id: conversation_id.clone(),
            ..ListMessagesQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id.to_hex(), second);

    let everything = queries
        .handle_list_messages(ListMessagesQuery {
            conversation_id,
            include_deleted: true,
            oldest_first: true,
            ..ListMessagesQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(everything.len(), 2);
    assert_eq!(everything[0].id.to_hex(), first);

    let err = commands
        .handle_add_tags(AddTagsCommand {
            message_id: first,
            tags: vec!["late".to_string()],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, MessageStoreError::Deleted(_)));
}
