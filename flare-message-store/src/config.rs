use std::env;

use anyhow::{Result, anyhow};
use flare_chat_core::config::{ConfigManager, FlareAppConfig};

use crate::domain::service::MessageStoreDomainConfig;

const DEFAULT_DATABASE: &str = "flare_chat";
const DEFAULT_COLLECTION: &str = "messages";
const DEFAULT_MAX_PAGE_SIZE: u32 = 200;

#[derive(Clone, Debug)]
pub struct MessageStoreConfig {
    pub service_name: String,
    /// 未配置时使用内存集合
    pub mongo_url: Option<String>,
    pub mongo_database: String,
    pub mongo_collection: String,
    pub max_page_size: u32,
    /// 写入标签的最大字符数，未配置时不限制
    pub max_tag_length: Option<usize>,
}

impl Default for MessageStoreConfig {
    fn default() -> Self {
        Self {
            service_name: "message-store".to_string(),
            mongo_url: None,
            mongo_database: DEFAULT_DATABASE.to_string(),
            mongo_collection: DEFAULT_COLLECTION.to_string(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_tag_length: None,
        }
    }
}

impl MessageStoreConfig {
    /// 从应用配置加载，环境变量优先
    pub fn from_app_config(app: &FlareAppConfig) -> Result<Self> {
        Self::resolve(app, |key| env::var(key).ok())
    }

    /// 以给定的变量来源解析配置
    pub fn resolve<F>(app: &FlareAppConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        app.validate_references()?;
        let service_config = app.message_store_service();
        let defaults = Self::default();

        let service_name = service_config
            .service_name
            .clone()
            .unwrap_or(defaults.service_name);

        // 解析 MongoDB 配置引用
        let profile_override = lookup("FLARE_MONGO_PROFILE");
        let profile = ConfigManager::resolve_mongo_profile(
            app,
            profile_override.as_deref(),
            service_config.mongo.as_deref(),
        );

        let mongo_url = lookup("MESSAGE_STORE_MONGO_URL")
            .or_else(|| profile.as_ref().map(|profile| profile.url.clone()))
            .filter(|url| !url.trim().is_empty());

        let mongo_database = lookup("MESSAGE_STORE_MONGO_DATABASE")
            .or_else(|| profile.as_ref().and_then(|profile| profile.database.clone()))
            .unwrap_or(defaults.mongo_database);

        let mongo_collection = lookup("MESSAGE_STORE_COLLECTION")
            .or_else(|| service_config.collection.clone())
            .unwrap_or(defaults.mongo_collection);

        let max_page_size = match lookup("MESSAGE_STORE_MAX_PAGE_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|err| anyhow!("invalid MESSAGE_STORE_MAX_PAGE_SIZE '{raw}': {err}"))?,
            None => service_config
                .max_page_size
                .unwrap_or(defaults.max_page_size),
        };
        if max_page_size == 0 {
            return Err(anyhow!("max_page_size must be greater than 0"));
        }

        let max_tag_length = service_config.max_tag_length;
        if max_tag_length == Some(0) {
            return Err(anyhow!("max_tag_length must be greater than 0"));
        }

        Ok(Self {
            service_name,
            mongo_url,
            mongo_database,
            mongo_collection,
            max_page_size,
            max_tag_length,
        })
    }

    /// 转换为领域服务配置
    pub fn domain_config(&self) -> MessageStoreDomainConfig {
        MessageStoreDomainConfig {
            max_page_size: i64::from(self.max_page_size),
            max_tag_length: self.max_tag_length,
        }
    }
}
