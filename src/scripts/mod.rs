//! 注入脚本
//!
//! 每个脚本都是一个 `PageScript`：给定页面和参数，返回 JSON 或者什么也不返回。

pub mod registry;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::infrastructure::{JsExecutor, PortalPage};

pub use registry::ScriptRegistry;

/// 脚本参数
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptParams<'a> {
    pub sem_id: Option<&'a str>,
}

impl<'a> ScriptParams<'a> {
    pub fn with_sem_id(sem_id: Option<&'a str>) -> Self {
        Self { sem_id }
    }
}

/// 页面脚本能力
#[async_trait]
pub trait PageScript: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, page: &dyn PortalPage, params: ScriptParams<'_>) -> Option<JsonValue>;
}

/// 抓取类脚本：学期列表和五个数据类别
#[derive(Debug, Clone)]
pub struct ExtractionScript {
    name: String,
    body: String,
}

impl ExtractionScript {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

#[async_trait]
impl PageScript for ExtractionScript {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, page: &dyn PortalPage, params: ScriptParams<'_>) -> Option<JsonValue> {
        JsExecutor::new(page).run(&self.body, params.sem_id).await
    }
}

/// 验证码求解脚本，只产生副作用
#[derive(Debug, Clone)]
pub struct CaptchaSolver {
    body: String,
}

impl CaptchaSolver {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 执行求解脚本，出错只记日志
    pub async fn solve(&self, page: &dyn PortalPage) {
        match page.evaluate(&self.body).await {
            Ok(_) => info!("🧩 验证码求解脚本已执行"),
            Err(e) => warn!("验证码求解脚本出错: {}", e),
        }
    }
}

#[async_trait]
impl PageScript for CaptchaSolver {
    fn name(&self) -> &str {
        "captcha_solver"
    }

    async fn execute(&self, page: &dyn PortalPage, _params: ScriptParams<'_>) -> Option<JsonValue> {
        self.solve(page).await;
        None
    }
}
