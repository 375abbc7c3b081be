//! 基于 chromiumoxide 的 `PortalPage` 实现
//!
//! 持有唯一的 Browser 与 Page，会话结束时统一关闭。

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::error::{PageError, PageResult};
use crate::infrastructure::PortalPage;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// DOM 无变化多久算静止
const QUIET_MS: u64 = 500;

pub struct ChromiumPage {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumPage {
    pub fn new(browser: Browser, page: Page, handler: JoinHandle<()>) -> Self {
        Self {
            page,
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handler)),
        }
    }

    /// 反复执行返回布尔值的脚本，直到为 true 或超时
    ///
    /// 导航过程中执行上下文会被销毁，期间的脚本错误按“尚未满足”处理。
    async fn poll_until(&self, probe: &str, what: &str, limit: Duration) -> PageResult<()> {
        let deadline = Instant::now() + limit;
        loop {
            match self.page.evaluate(probe).await {
                Ok(result) => {
                    if result.value().and_then(JsonValue::as_bool).unwrap_or(false) {
                        return Ok(());
                    }
                }
                Err(e) => debug!("等待 {} 时脚本出错: {}", what, e),
            }
            if Instant::now() >= deadline {
                return Err(PageError::timeout(what, limit));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// JS 字符串字面量
fn js_literal(text: &str) -> String {
    JsonValue::String(text.to_string()).to_string()
}

#[async_trait]
impl PortalPage for ChromiumPage {
    async fn goto(&self, url: &str) -> PageResult<()> {
        self.page.goto(url).await.map_err(|e| PageError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, limit: Duration) -> PageResult<()> {
        let probe = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.visibility !== 'hidden' && style.display !== 'none'
                    && (rect.width > 0 || rect.height > 0);
            }})()
            "#,
            js_literal(selector)
        );
        self.poll_until(&probe, selector, limit).await
    }

    async fn wait_for_text(&self, text: &str, limit: Duration) -> PageResult<()> {
        let probe = format!(
            "(() => !!document.body && document.body.innerText.includes({}))()",
            js_literal(text)
        );
        self.poll_until(&probe, text, limit).await
    }

    async fn click_and_wait_for_navigation(&self, selector: &str, limit: Duration) -> PageResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| PageError::Element {
                selector: selector.to_string(),
                message: e.to_string(),
            })?;

        let navigation = async {
            element.click().await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match timeout(limit, navigation).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PageError::Element {
                selector: selector.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(PageError::timeout(format!("点击 {} 后的导航", selector), limit)),
        }
    }

    async fn reload(&self) -> PageResult<()> {
        self.page.reload().await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> PageResult<()> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.focus();
                el.value = {};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            js_literal(selector),
            js_literal(value)
        );
        let filled = self.evaluate(&script).await?;
        if filled.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(PageError::Element {
                selector: selector.to_string(),
                message: "元素不存在".to_string(),
            })
        }
    }

    async fn evaluate(&self, script: &str) -> PageResult<JsonValue> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    async fn body_text(&self, limit: Duration) -> PageResult<String> {
        let read = self
            .page
            .evaluate("document.body ? document.body.innerText : ''");
        match timeout(limit, read).await {
            Ok(Ok(result)) => Ok(result
                .value()
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(PageError::timeout("body", limit)),
        }
    }

    async fn wait_for_network_idle(&self, limit: Duration) -> PageResult<()> {
        let timeout_ms = limit.as_millis() as u64;
        let script = format!(
            r#"new Promise((resolve) => {{
                const QUIET_MS = {QUIET_MS};
                let timer;
                let obs;
                const deadline = setTimeout(() => {{
                    if (obs) obs.disconnect();
                    clearTimeout(timer);
                    resolve(false);
                }}, {timeout_ms});
                function waitForQuiet() {{
                    obs = new MutationObserver(() => {{
                        clearTimeout(timer);
                        timer = setTimeout(done, QUIET_MS);
                    }});
                    obs.observe(document.documentElement, {{
                        childList: true, subtree: true, attributes: true
                    }});
                    timer = setTimeout(done, QUIET_MS);
                }}
                function done() {{
                    obs.disconnect();
                    clearTimeout(deadline);
                    resolve(true);
                }}
                if (document.readyState !== 'complete') {{
                    window.addEventListener('load', waitForQuiet, {{ once: true }});
                }} else {{
                    waitForQuiet();
                }}
            }})"#
        );

        // 页面跳转会让 promise 永远不返回，外层再套一层超时
        match timeout(limit + POLL_INTERVAL, self.page.evaluate(script)).await {
            Ok(Ok(result)) if result.value().and_then(JsonValue::as_bool) == Some(true) => Ok(()),
            Ok(Ok(_)) | Err(_) => Err(PageError::timeout("网络静止", limit)),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn close(&self) -> PageResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        if let Some(handler) = self.handler.lock().await.take() {
            handler.abort();
        }
        debug!("浏览器已关闭");

        closed.map(|_| ()).map_err(PageError::from)
    }
}
