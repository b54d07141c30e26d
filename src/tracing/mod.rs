//! # 日志初始化模块
//!
//! 为各个服务模块提供统一的 tracing-subscriber 初始化能力。

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// 按日志配置安装全局 fmt subscriber
///
/// 过滤规则优先取环境变量 `RUST_LOG`，否则使用 `logging.level`；
/// 未提供配置时按 debug 级别输出。全局 subscriber 已存在时（例如测试中重复初始化）
/// 静默忽略。
///
/// ```rust,ignore
/// let app = flare_chat_core::load_config(Some("config"));
/// init_tracing_from_config(Some(&app.logging));
/// ```
pub fn init_tracing_from_config(logging_config: Option<&LoggingConfig>) {
    let default_config = LoggingConfig::default();
    let config = logging_config.unwrap_or(&default_config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt::Subscriber::builder()
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number)
        .with_env_filter(env_filter);

    if builder.try_init().is_ok() {
        tracing::debug!(level = %config.level, "tracing initialized");
    }
}
