//! 登录流程 - 流程层
//!
//! 状态机：
//!
//! ```text
//! Navigating → AwaitingForm → AwaitingCaptchaField (刷新重试)
//!     → CredentialsFilled → CaptchaAttempt(n) (首次求解 + 有上限的重试)
//!     → Authenticated | Failed(原因)
//! ```
//!
//! 两个重试循环各自由一个 `RetryPolicy` 控制。状态机本身不关闭浏览器，
//! 资源释放由会话控制器负责。

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Config, RetryPolicy};
use crate::error::{AppError, AppResult, LoginFailure, PageError};
use crate::infrastructure::PortalPage;
use crate::models::Credentials;
use crate::scripts::CaptchaSolver;
use crate::services::{ErrorClassifier, PortalError};

/// 登录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Navigating,
    AwaitingForm,
    AwaitingCaptchaField,
    CredentialsFilled,
    /// 第 `attempt` 次求解验证码（从 1 开始）
    CaptchaAttempt { attempt: u32 },
    Authenticated,
    Failed(LoginFailure),
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginState::Navigating => write!(f, "navigating"),
            LoginState::AwaitingForm => write!(f, "awaiting_form"),
            LoginState::AwaitingCaptchaField => write!(f, "awaiting_captcha_field"),
            LoginState::CredentialsFilled => write!(f, "credentials_filled"),
            LoginState::CaptchaAttempt { attempt } => write!(f, "captcha_attempt#{}", attempt),
            LoginState::Authenticated => write!(f, "authenticated"),
            LoginState::Failed(reason) => write!(f, "failed({:?})", reason),
        }
    }
}

/// 登录过程统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginReport {
    /// 验证码求解脚本执行次数
    pub solver_invocations: u32,
    /// 等待验证码输入框时的刷新次数
    pub reloads: u32,
}

/// 登录流程
///
/// - 只依赖 `PortalPage`、求解脚本和错误识别器
/// - 不持有页面
pub struct LoginFlow<'a> {
    config: &'a Config,
    solver: &'a CaptchaSolver,
    classifier: &'a dyn ErrorClassifier,
}

impl<'a> LoginFlow<'a> {
    pub fn new(config: &'a Config, solver: &'a CaptchaSolver, classifier: &'a dyn ErrorClassifier) -> Self {
        Self {
            config,
            solver,
            classifier,
        }
    }

    /// 执行登录，直到进入已登录状态或失败
    pub async fn run(&self, page: &dyn PortalPage, credentials: &Credentials) -> AppResult<LoginReport> {
        debug!("开始登录: {}", credentials.username);
        let mut report = LoginReport::default();
        let mut state = LoginState::Navigating;

        loop {
            let next = self.step(state, page, credentials, &mut report).await?;
            debug!("登录状态: {} → {}", state, next);
            state = next;

            match state {
                LoginState::Authenticated => {
                    info!("✅ 登录成功，验证码求解 {} 次", report.solver_invocations);
                    return Ok(report);
                }
                LoginState::Failed(reason) => {
                    warn!(
                        "❌ 登录失败: {} (验证码求解 {} 次)",
                        reason, report.solver_invocations
                    );
                    return Err(AppError::Login(reason));
                }
                _ => {}
            }
        }
    }

    async fn step(
        &self,
        state: LoginState,
        page: &dyn PortalPage,
        credentials: &Credentials,
        report: &mut LoginReport,
    ) -> AppResult<LoginState> {
        let portal = &self.config.portal;
        let timeouts = &self.config.timeouts;

        let next = match state {
            LoginState::Navigating => {
                page.goto(&portal.base_url).await?;
                page.wait_for_selector(&portal.login_trigger_selector, timeouts.form())
                    .await?;
                info!("登录入口已加载");
                LoginState::AwaitingForm
            }
            LoginState::AwaitingForm => {
                page.click_and_wait_for_navigation(&portal.login_trigger_selector, timeouts.navigation())
                    .await?;
                page.wait_for_text(&portal.login_heading_text, timeouts.form())
                    .await?;
                info!("登录页已加载");
                LoginState::AwaitingCaptchaField
            }
            LoginState::AwaitingCaptchaField => {
                self.await_captcha_field(page, report).await?;
                page.fill(&portal.username_selector, &credentials.username).await?;
                page.fill(&portal.password_selector, &credentials.password).await?;
                LoginState::CredentialsFilled
            }
            LoginState::CredentialsFilled => {
                info!("🧩 开始求解验证码...");
                LoginState::CaptchaAttempt { attempt: 1 }
            }
            LoginState::CaptchaAttempt { attempt } => self.captcha_attempt(attempt, page, report).await?,
            terminal @ (LoginState::Authenticated | LoginState::Failed(_)) => terminal,
        };
        Ok(next)
    }

    /// 等待验证码输入框出现，等不到就刷新页面
    async fn await_captcha_field(&self, page: &dyn PortalPage, report: &mut LoginReport) -> AppResult<()> {
        let selector = &self.config.portal.captcha_field_selector;
        let wait = self.config.timeouts.captcha_field();
        let policy: RetryPolicy = self.config.captcha_field_retry;

        loop {
            match page.wait_for_selector(selector, wait).await {
                Ok(()) => {
                    info!("验证码输入框已出现");
                    return Ok(());
                }
                Err(e) if e.is_timeout() => {
                    if !policy.allows_another(report.reloads) {
                        warn!("刷新 {} 次后验证码输入框仍未出现", report.reloads);
                        return Err(PageError::timeout(selector.as_str(), wait).into());
                    }
                    info!("未检测到验证码，刷新页面...");
                    page.reload().await?;
                    report.reloads += 1;
                    if !policy.backoff().is_zero() {
                        sleep(policy.backoff()).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// 一次验证码求解 + 结果判定
    async fn captcha_attempt(
        &self,
        attempt: u32,
        page: &dyn PortalPage,
        report: &mut LoginReport,
    ) -> AppResult<LoginState> {
        let policy = self.config.captcha_solve_retry;

        self.solver.solve(page).await;
        report.solver_invocations += 1;

        if let Err(e) = page.wait_for_network_idle(self.config.timeouts.network_idle()).await {
            debug!("等待网络静止未完成，继续: {}", e);
        }
        if attempt > 1 && !policy.backoff().is_zero() {
            sleep(policy.backoff()).await;
        }

        let next = match self.classifier.classify(page).await {
            None => {
                let url = page.current_url().await?;
                if url.starts_with(&self.config.portal.landing_url_prefix) {
                    LoginState::Authenticated
                } else {
                    warn!("未检测到错误，但当前地址不在登录后区域: {}", url);
                    LoginState::Failed(LoginFailure::LoginUnverified)
                }
            }
            Some(PortalError::Captcha) => {
                // 第一次求解不算重试
                let retries = attempt - 1;
                if policy.allows_another(retries) {
                    info!("验证码错误，第 {} 次重试", retries + 1);
                    LoginState::CaptchaAttempt { attempt: attempt + 1 }
                } else {
                    warn!("验证码重试已达上限 ({} 次重试, 共求解 {} 次)", retries, attempt);
                    LoginState::Failed(LoginFailure::CaptchaExhausted)
                }
            }
            Some(kind @ (PortalError::Login | PortalError::Credentials)) => {
                warn!("检测到 {} 错误，请检查用户名和密码", kind);
                LoginState::Failed(LoginFailure::InvalidCredentials)
            }
            Some(other) => {
                warn!("检测到未知错误: {}", other);
                LoginState::Failed(LoginFailure::Unknown)
            }
        };
        Ok(next)
    }
}
