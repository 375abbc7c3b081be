use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use rand::seq::IndexedRandom;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::BrowserSettings;
use crate::error::{AppResult, BrowserError};
use crate::infrastructure::{ChromiumPage, PortalPage, SessionFactory};

/// 启动一个独立的无头浏览器，并打开空白页
pub async fn launch_headless_browser(settings: &BrowserSettings) -> AppResult<ChromiumPage> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder();
    if settings.headless {
        builder = builder.new_headless_mode();
    } else {
        builder = builder.with_head();
    }
    if let Some(executable) = settings.executable.as_deref() {
        debug!("浏览器可执行文件: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let mut args = vec![
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
    ];
    if let Some(user_agent) = pick_user_agent(&settings.user_agents) {
        debug!("User-Agent: {}", user_agent);
        args.push(format!("--user-agent={}", user_agent));
    }

    let config = builder.args(args).build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        BrowserError::ConfigurationFailed(e)
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        BrowserError::LaunchFailed(e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let created = browser.new_page("about:blank").await;
    let page = match created {
        Ok(page) => page,
        Err(e) => {
            error!("创建页面失败: {}", e);
            let mut browser = browser;
            let _ = browser.close().await;
            handler_task.abort();
            return Err(BrowserError::PageCreationFailed(e).into());
        }
    };

    Ok(ChromiumPage::new(browser, page, handler_task))
}

fn pick_user_agent(pool: &[String]) -> Option<&str> {
    pool.choose(&mut rand::rng()).map(String::as_str)
}

/// 每个请求启动一个新的无头浏览器
#[derive(Clone, Debug)]
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionFactory for ChromiumLauncher {
    async fn open(&self) -> AppResult<Box<dyn PortalPage>> {
        let page = launch_headless_browser(&self.settings).await?;
        Ok(Box::new(page))
    }
}
