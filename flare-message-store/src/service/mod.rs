//! 服务模块 - 包含配置加载、日志初始化与依赖组装

use anyhow::Result;
use flare_chat_core::config::load_config;
use flare_chat_core::tracing::init_tracing_from_config;
use tracing::info;

pub mod wire;

pub use wire::ApplicationContext;

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 加载配置、初始化日志并构建应用上下文
    ///
    /// # 参数
    /// * `config_path` - 配置文件或配置目录，`None` 时依次尝试 `config` 与 `config.toml`
    pub async fn create_context(config_path: Option<&str>) -> Result<ApplicationContext> {
        let app_config = load_config(config_path);
        init_tracing_from_config(Some(&app_config.logging));

        let context = wire::initialize(app_config).await?;
        info!(
            service = %context.config.service_name,
            persistent = context.config.mongo_url.is_some(),
            "ApplicationBootstrap created successfully"
        );
        Ok(context)
    }
}
