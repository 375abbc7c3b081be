//! 会话控制器 - 编排层
//!
//! ## 职责
//!
//! 1. **资源所有者**：每个请求打开一个独立页面（浏览器上下文），用完即关
//! 2. **流程调度**：登录 → 抓取
//! 3. **超时与取消**：整个请求受总超时和 `CancellationToken` 约束，两个重试循环都会被中断
//! 4. **必然清理**：成功、分类失败、意外错误、超时、取消，全部路径都关闭页面

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{PortalPage, SessionFactory};
use crate::models::{Credentials, ExtractionResult, SemesterSelection};
use crate::scripts::ScriptRegistry;
use crate::services::ErrorClassifier;
use crate::utils::logging::{log_request_complete, log_request_failed};
use crate::workflow::{CollectFlow, LoginFlow};

/// 会话控制器
///
/// 本身不保存任何会话状态，可以在多个请求间共享。
pub struct SessionController {
    config: Arc<Config>,
    registry: Arc<ScriptRegistry>,
    classifier: Arc<dyn ErrorClassifier>,
    factory: Arc<dyn SessionFactory>,
}

impl SessionController {
    pub fn new(
        config: Arc<Config>,
        registry: Arc<ScriptRegistry>,
        classifier: Arc<dyn ErrorClassifier>,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            config,
            registry,
            classifier,
            factory,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 处理一个请求：登录并抓取全部数据
    pub async fn fetch(
        &self,
        credentials: &Credentials,
        selection: SemesterSelection,
        cancel: CancellationToken,
    ) -> AppResult<ExtractionResult> {
        let started = Instant::now();
        let limit = self.config.request_timeout();
        let deadline = tokio::time::Instant::now() + limit;

        // 启动浏览器也计入总超时
        let opened = tokio::select! {
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            res = tokio::time::timeout_at(deadline, self.factory.open()) => {
                res.unwrap_or(Err(AppError::Timeout(limit)))
            }
        };
        let page = match opened {
            Ok(page) => page,
            Err(e) => {
                log_request_failed(&e, started.elapsed());
                return Err(e);
            }
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            res = tokio::time::timeout_at(deadline, self.drive(page.as_ref(), credentials, selection)) => {
                res.unwrap_or(Err(AppError::Timeout(limit)))
            }
        };

        if let Err(e) = page.close().await {
            error!("关闭浏览器失败: {}", e);
        }

        match &outcome {
            Ok(result) => log_request_complete(result, started.elapsed()),
            Err(e) => log_request_failed(e, started.elapsed()),
        }
        outcome
    }

    async fn drive(
        &self,
        page: &dyn PortalPage,
        credentials: &Credentials,
        selection: SemesterSelection,
    ) -> AppResult<ExtractionResult> {
        let login = LoginFlow::new(&self.config, self.registry.captcha_solver(), self.classifier.as_ref());
        let report = login.run(page, credentials).await?;
        if report.reloads > 0 {
            warn!("登录过程中刷新了 {} 次页面", report.reloads);
        }

        info!("🔍 登录成功，开始抓取数据...");
        Ok(CollectFlow::new(&self.registry).run(page, selection).await)
    }
}
