use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc, oid::ObjectId};
use mongodb::options::{
    ClientOptions, CreateIndexOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions,
    ReturnDocument,
};
use mongodb::{Client, Collection, IndexModel};
use tracing::info;

use super::document::{
    MessageDocument, filter_document, id_filter, sort_document, update_document,
};
use crate::config::MessageStoreConfig;
use crate::domain::model::{Message, MessageFilter, MessageUpdate};
use crate::domain::repository::MessageRepository;

pub struct MongoMessageRepository {
    collection: Collection<MessageDocument>,
    _client: Arc<Client>,
}

impl MongoMessageRepository {
    /// 未配置连接地址时返回 `Ok(None)`
    pub async fn new(config: &MessageStoreConfig) -> Result<Option<Self>> {
        let uri = match &config.mongo_url {
            Some(url) => url,
            None => return Ok(None),
        };

        let options = ClientOptions::parse(uri).await?;
        let client = Arc::new(Client::with_options(options)?);
        let database = client.database(&config.mongo_database);
        let collection = database.collection::<MessageDocument>(&config.mongo_collection);

        ensure_indexes(&collection).await?;
        info!(
            database = %config.mongo_database,
            collection = %config.mongo_collection,
            "MongoDB message collection ready"
        );

        Ok(Some(Self {
            collection,
            _client: client,
        }))
    }
}

async fn ensure_indexes(collection: &Collection<MessageDocument>) -> Result<()> {
    let conversation_index = IndexModel::builder()
        .keys(doc! {"conversationId": 1, "createdAt": -1})
        .options(
            IndexOptions::builder()
                .name(Some("idx_conversation_created".to_string()))
                .build(),
        )
        .build();
    collection
        .create_index(conversation_index, None::<CreateIndexOptions>)
        .await?;

    let tags_index = IndexModel::builder()
        .keys(doc! {"tags": 1})
        .options(
            IndexOptions::builder()
                .name(Some("idx_tags".to_string()))
                .build(),
        )
        .build();
    collection
        .create_index(tags_index, None::<CreateIndexOptions>)
        .await?;

    Ok(())
}

#[async_trait]
impl MessageRepository for MongoMessageRepository {
    async fn insert(&self, message: &Message) -> Result<ObjectId> {
        let document = MessageDocument::from(message);
        self.collection
            .insert_one(&document, None)
            .await
            .with_context(|| format!("insert message {}", message.id))?;
        Ok(message.id)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Message>> {
        let document = self
            .collection
            .find_one(id_filter(id, false), None)
            .await?;
        Ok(document.map(Message::from))
    }

    async fn find_where(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        let options = FindOptions::builder()
            .sort(sort_document(filter.sort))
            .skip(filter.offset)
            .limit(filter.limit)
            .build();

        let cursor = self
            .collection
            .find(filter_document(filter), options)
            .await?;
        let documents: Vec<MessageDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Message::from).collect())
    }

    async fn update_by_id(&self, id: &ObjectId, update: &MessageUpdate) -> Result<Option<Message>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let document = self
            .collection
            .find_one_and_update(
                id_filter(id, update.require_active),
                update_document(&update.change, bson::DateTime::now()),
                options,
            )
            .await
            .with_context(|| format!("update message {id}"))?;
        Ok(document.map(Message::from))
    }

    async fn distinct_tags(&self) -> Result<Vec<String>> {
        let values = self
            .collection
            .distinct("tags", None::<Document>, None)
            .await?;
        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                Bson::String(tag) => Some(tag),
                _ => None,
            })
            .collect())
    }

    async fn purge(&self) -> Result<u64> {
        let result = self.collection.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }
}
