//! Wire 风格的依赖注入模块
//!
//! 类似 Go 的 Wire 框架，按依赖顺序构建所有组件

use std::sync::Arc;

use anyhow::{Context, Result};
use flare_chat_core::config::FlareAppConfig;
use tracing::{info, warn};

use crate::application::handlers::{MessageStoreCommandHandler, MessageStoreQueryHandler};
use crate::config::MessageStoreConfig;
use crate::domain::repository::{ConversationResolver, MessageRepository, SenderResolver};
use crate::domain::service::MessageStore;
use crate::infrastructure::persistence::{InMemoryMessageRepository, MongoMessageRepository};
use crate::infrastructure::resolver::IdOnlyResolver;

/// 应用上下文 - 包含所有已初始化的服务
pub struct ApplicationContext {
    pub config: MessageStoreConfig,
    pub store: Arc<MessageStore>,
    pub command_handler: Arc<MessageStoreCommandHandler>,
    pub query_handler: Arc<MessageStoreQueryHandler>,
}

/// 构建应用上下文（引用解析只返回 id）
///
/// # 参数
/// * `app_config` - 应用配置
pub async fn initialize(app_config: &FlareAppConfig) -> Result<ApplicationContext> {
    let resolver = Arc::new(IdOnlyResolver);
    initialize_with_resolvers(app_config, resolver.clone(), resolver).await
}

/// 构建应用上下文，使用调用方提供的会话 / 发送者解析器
pub async fn initialize_with_resolvers(
    app_config: &FlareAppConfig,
    conversations: Arc<dyn ConversationResolver>,
    senders: Arc<dyn SenderResolver>,
) -> Result<ApplicationContext> {
    // 1. 加载消息存储配置
    let config = MessageStoreConfig::from_app_config(app_config)
        .context("Failed to load message store service configuration")?;

    // 2. 创建消息集合
    let repository = build_repository(&config).await?;

    // 3. 组装领域服务与处理器
    Ok(assemble(config, repository, conversations, senders))
}

/// 根据配置选择消息集合：配置了 MongoDB 时使用 MongoDB，否则使用内存集合
pub async fn build_repository(config: &MessageStoreConfig) -> Result<Arc<dyn MessageRepository>> {
    match MongoMessageRepository::new(config)
        .await
        .context("Failed to connect message collection")?
    {
        Some(repository) => Ok(Arc::new(repository)),
        None => {
            warn!("MongoDB not configured, messages are kept in memory only");
            Ok(Arc::new(InMemoryMessageRepository::new()))
        }
    }
}

/// 用已构建的依赖组装应用上下文
pub fn assemble(
    config: MessageStoreConfig,
    repository: Arc<dyn MessageRepository>,
    conversations: Arc<dyn ConversationResolver>,
    senders: Arc<dyn SenderResolver>,
) -> ApplicationContext {
    let store = Arc::new(MessageStore::new(
        repository,
        conversations,
        senders,
        config.domain_config(),
    ));

    let command_handler = Arc::new(MessageStoreCommandHandler::new(store.clone()));
    let query_handler = Arc::new(MessageStoreQueryHandler::new(store.clone()));

    info!(service = %config.service_name, "message store initialized");

    ApplicationContext {
        config,
        store,
        command_handler,
        query_handler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::CreateMessageCommand;
    use crate::application::queries::GetMessageQuery;
    use mongodb::bson::oid::ObjectId;

    #[tokio::test]
    async fn test_memory_repository_without_mongo_url() {
        let config = MessageStoreConfig::default();
        let repository = build_repository(&config).await.unwrap();
        let resolver = Arc::new(IdOnlyResolver);
        let context = assemble(config, repository, resolver.clone(), resolver);

        let created = context
            .command_handler
            .handle_create_message(CreateMessageCommand {
                conversation_id: ObjectId::new().to_hex(),
                sender_id: ObjectId::new().to_hex(),
                text: "wired".to_string(),
                tags: None,
            })
            .await
            .unwrap();

        let fetched = context
            .query_handler
            .handle_get_message(GetMessageQuery {
                message_id: created.id.to_hex(),
            })
            .await
            .unwrap();
        assert_eq!(fetched.text, "wired");
        assert_eq!(context.store.config().max_page_size, 200);
    }
}
