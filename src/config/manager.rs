//! 配置管理器 - 负责处理不同环境下的配置选择和覆盖
//!
//! 该模块提供了配置管理功能，包括：
//! - 按覆盖优先级选择 MongoDB 配置
//! - 加载环境特定配置

use std::env;
use std::path::Path;

use anyhow::Result;
use toml::Value;

use super::{FlareAppConfig, MongoInstanceConfig, load_toml_value, merge_value};

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 选择 MongoDB 配置
    ///
    /// 优先级：
    /// 1. 覆盖名称（通常来自环境变量 FLARE_MONGO_PROFILE）指定的配置
    /// 2. 服务配置中引用的配置
    pub fn resolve_mongo_profile(
        config: &FlareAppConfig,
        override_profile: Option<&str>,
        profile_name: Option<&str>,
    ) -> Option<MongoInstanceConfig> {
        override_profile
            .and_then(|name| config.mongodb_profile(name))
            .or_else(|| profile_name.and_then(|name| config.mongodb_profile(name)))
            .cloned()
    }

    /// 获取当前环境名称
    ///
    /// 从环境变量 FLARE_ENV 获取当前环境名称，
    /// 如果未设置则默认为 "development"
    pub fn get_environment() -> String {
        env::var("FLARE_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// 根据环境加载特定配置
    ///
    /// 加载 `{config_root}/environments/{environment}.toml`，
    /// 并将其按表递归合并到基础配置值中。文件不存在时不做任何修改。
    pub fn load_environment_config(base: &mut Value, config_root: &Path) -> Result<()> {
        let env_config_path = config_root
            .join("environments")
            .join(format!("{}.toml", Self::get_environment()));

        if env_config_path.exists() {
            let env_config = load_toml_value(&env_config_path)?;
            merge_value(base, env_config);
            tracing::debug!(path = %env_config_path.display(), "environment config merged");
        }

        Ok(())
    }
}
