//! Flare Chat Core 公共库
//!
//! 提供统一的配置加载、日志初始化和通用工具函数

pub mod config;
pub mod tracing;
pub mod utils;

pub use config::{
    ConfigManager, FlareAppConfig, LoggingConfig, MessageStoreServiceConfig, MongoInstanceConfig,
    ServicesConfig, app_config, load_config, load_config_from_path,
};
pub use utils::*;
