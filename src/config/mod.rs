//! Flare Chat Core 配置模块
//!
//! 该模块提供了应用程序配置管理功能，包括：
//! - 配置文件加载和解析
//! - 环境特定配置覆盖
//! - MongoDB、日志与消息存储服务配置定义

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use toml::Value;
use tracing::warn;

mod manager;
pub use manager::ConfigManager;

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<FlareAppConfig> = OnceLock::new();

/// MongoDB 实例配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MongoInstanceConfig {
    /// MongoDB 连接 URL
    pub url: String,
    /// 数据库名称
    #[serde(default)]
    pub database: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 语法）
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub with_target: bool,
    #[serde(default)]
    pub with_thread_ids: bool,
    #[serde(default = "default_true")]
    pub with_file: bool,
    #[serde(default = "default_true")]
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: false,
            with_thread_ids: false,
            with_file: true,
            with_line_number: true,
        }
    }
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_true() -> bool {
    true
}

/// 消息存储服务配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MessageStoreServiceConfig {
    /// 服务名称
    #[serde(default)]
    pub service_name: Option<String>,
    /// 引用的 MongoDB 配置名称（对应 `[mongodb.<name>]`）
    #[serde(default)]
    pub mongo: Option<String>,
    /// 消息集合名称
    #[serde(default)]
    pub collection: Option<String>,
    /// 列表查询的最大分页大小
    #[serde(default)]
    pub max_page_size: Option<u32>,
    /// 单个标签的最大长度
    #[serde(default)]
    pub max_tag_length: Option<usize>,
}

/// 服务配置集合
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServicesConfig {
    /// 消息存储服务配置
    #[serde(default)]
    pub message_store: Option<MessageStoreServiceConfig>,
}

/// 应用配置根
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FlareAppConfig {
    /// MongoDB 配置集合
    #[serde(default)]
    pub mongodb: HashMap<String, MongoInstanceConfig>,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 各服务配置
    #[serde(default)]
    pub services: ServicesConfig,
}

impl FlareAppConfig {
    /// 获取 MongoDB 配置
    pub fn mongodb_profile(&self, name: &str) -> Option<&MongoInstanceConfig> {
        self.mongodb.get(name)
    }

    /// 获取消息存储服务配置
    pub fn message_store_service(&self) -> MessageStoreServiceConfig {
        self.services.message_store.clone().unwrap_or_default()
    }

    /// 验证服务配置中引用的基础设施配置是否存在
    pub fn validate_references(&self) -> Result<()> {
        if let Some(store) = &self.services.message_store {
            if let Some(mongo) = &store.mongo {
                if !self.mongodb.contains_key(mongo) {
                    return Err(anyhow!(
                        "services.message_store references unknown mongodb profile '{}'",
                        mongo
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 加载配置
///
/// 首次调用时加载并缓存到全局实例，之后的调用直接返回缓存。
pub fn load_config(path: Option<&str>) -> &'static FlareAppConfig {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config"), PathBuf::from("config.toml")],
    };

    APP_CONFIG.get_or_init(|| load_with_fallback(&candidates))
}

/// 获取已加载的应用配置
pub fn app_config() -> Option<&'static FlareAppConfig> {
    APP_CONFIG.get()
}

/// 从指定路径加载配置（不写入全局实例）
///
/// 路径可以是单个 TOML 文件，也可以是包含 `base.toml` 的配置目录。
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<FlareAppConfig> {
    let path = path.as_ref();
    let mut merged = load_config_value(path)?;

    let env_root = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };
    ConfigManager::load_environment_config(&mut merged, &env_root)?;

    merged
        .try_into()
        .with_context(|| format!("invalid configuration: {}", path.display()))
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf]) -> FlareAppConfig {
    for path in candidates {
        match load_config_from_path(path) {
            Ok(cfg) => return cfg,
            Err(err) => {
                warn!("failed to load config from {}: {err:#}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    FlareAppConfig::default()
}

/// 从源加载原始配置值
fn load_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("unable to read metadata for {}", path.display()))?;

    if metadata.is_dir() {
        load_directory_value(path)
    } else {
        load_toml_value(path)
    }
}

/// 从目录加载配置
fn load_directory_value(path: &Path) -> Result<Value> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        return Err(anyhow!(
            "missing base configuration: {}",
            base_file.display()
        ));
    }

    let mut merged = load_toml_value(&base_file)?;

    if !merged.is_table() {
        return Err(anyhow!(
            "base configuration must be a table: {}",
            base_file.display()
        ));
    }

    merge_directory(&mut merged, &path.join("shared"))?;
    merge_directory(&mut merged, &path.join("services"))?;
    merge_directory(&mut merged, &path.join("overrides"))?;

    Ok(merged)
}

/// 合并目录中的配置片段（按文件名排序）
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let value = load_toml_value(&entry.path())?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
pub(crate) fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 合并值：表按键递归合并，其他值直接覆盖
pub(crate) fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flare-chat-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
            [mongodb.primary]
            url = "mongodb://localhost:27017"
            database = "chat"

            [logging]
            level = "info"
            with_thread_ids = true

            [services.message_store]
            mongo = "primary"
            collection = "chat_messages"
            max_page_size = 50
        "#;

        let cfg: FlareAppConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.logging.with_thread_ids);
        assert!(cfg.logging.with_file);

        let store = cfg.message_store_service();
        assert_eq!(store.mongo.as_deref(), Some("primary"));
        assert_eq!(store.collection.as_deref(), Some("chat_messages"));
        assert_eq!(store.max_page_size, Some(50));
        assert_eq!(
            cfg.mongodb_profile("primary").and_then(|p| p.database.as_deref()),
            Some("chat")
        );
        assert!(cfg.validate_references().is_ok());
    }

    #[test]
    fn test_validate_references_rejects_unknown_profile() {
        let raw = r#"
            [services.message_store]
            mongo = "missing"
        "#;
        let cfg: FlareAppConfig = toml::from_str(raw).unwrap();
        assert!(cfg.validate_references().is_err());
    }

    #[test]
    fn test_load_directory_merges_fragments_in_order() {
        let dir = scratch_dir();
        fs::write(
            dir.join("base.toml"),
            "[logging]\nlevel = \"warn\"\n\n[mongodb.primary]\nurl = \"mongodb://base\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("services")).unwrap();
        fs::write(
            dir.join("services").join("message_store.toml"),
            "[services.message_store]\nmongo = \"primary\"\nmax_page_size = 20\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join("overrides")).unwrap();
        fs::write(
            dir.join("overrides").join("local.toml"),
            "[mongodb.primary]\nurl = \"mongodb://override\"\n",
        )
        .unwrap();

        let cfg = load_config_from_path(&dir).unwrap();
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.mongodb["primary"].url, "mongodb://override");
        assert_eq!(cfg.message_store_service().max_page_size, Some(20));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_directory_requires_base() {
        let dir = scratch_dir();
        assert!(load_config_from_path(&dir).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_merge_value_overrides_scalars() {
        let mut base: Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: Value = toml::from_str("a = 5\n[t]\ny = 3\nz = 4\n").unwrap();
        merge_value(&mut base, overlay);

        assert_eq!(base["a"].as_integer(), Some(5));
        assert_eq!(base["t"]["x"].as_integer(), Some(1));
        assert_eq!(base["t"]["y"].as_integer(), Some(3));
        assert_eq!(base["t"]["z"].as_integer(), Some(4));
    }
}
