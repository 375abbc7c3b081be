use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vtop_scraper::browser::ChromiumLauncher;
use vtop_scraper::services::PhraseClassifier;
use vtop_scraper::utils::logging::log_startup;
use vtop_scraper::{api, logger, Config, ScriptRegistry, SessionController};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::load().context("加载配置失败")?;
    log_startup(&config);

    // 脚本缺失直接退出，不等到请求时才失败
    let registry = ScriptRegistry::load_dir(&config.scripts_dir)
        .with_context(|| format!("加载脚本失败: {}", config.scripts_dir))?;

    let classifier = PhraseClassifier::vtop(config.timeouts.error_probe());
    let launcher = ChromiumLauncher::new(config.browser.clone());
    let controller = Arc::new(SessionController::new(
        Arc::new(config),
        Arc::new(registry),
        Arc::new(classifier),
        Arc::new(launcher),
    ));

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("监听退出信号失败: {}", e);
            return;
        }
        info!("收到退出信号，正在停止...");
        signal.cancel();
    });

    api::serve(controller, shutdown).await
}
