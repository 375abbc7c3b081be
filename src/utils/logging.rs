//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::models::ExtractionResult;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 监听地址: {}", config.listen_addr);
    info!("🏫 门户地址: {}", config.portal.base_url);
    info!("📜 脚本目录: {}", config.scripts_dir);
    info!(
        "🔁 验证码重试上限: {}",
        config
            .captcha_solve_retry
            .max_attempts
            .map(|n| n.to_string())
            .unwrap_or_else(|| "不限".to_string())
    );
    info!("⏱️ 请求总超时: {:?}", config.request_timeout());
    info!("{}", "=".repeat(60));
}

/// 记录请求成功
pub fn log_request_complete(result: &ExtractionResult, elapsed: Duration) {
    info!("{}", "─".repeat(60));
    info!(
        "✅ 请求完成: {} 项数据, 用时 {:.1}s",
        result.len(),
        elapsed.as_secs_f64()
    );
    info!("📦 包含: {}", result.keys().collect::<Vec<_>>().join(", "));
    info!("{}", "─".repeat(60));
}

/// 记录请求失败
pub fn log_request_failed(err: &AppError, elapsed: Duration) {
    warn!("{}", "─".repeat(60));
    warn!(
        "❌ 请求失败 ({}): {}, 用时 {:.1}s",
        err.status_code(),
        err,
        elapsed.as_secs_f64()
    );
    warn!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
