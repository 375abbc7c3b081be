use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "vtop.toml";

/// 程序配置
///
/// 优先级：默认值 < TOML 文件 < 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 监听地址
    pub listen_addr: String,
    /// 注入脚本所在目录
    pub scripts_dir: String,
    /// 单个请求的总超时（毫秒）
    pub request_timeout_ms: u64,
    pub portal: PortalConfig,
    pub timeouts: StepTimeouts,
    /// 等待验证码输入框出现的重试策略
    pub captcha_field_retry: RetryPolicy,
    /// 验证码求解的重试策略：`max_attempts` 只计重试，不含第一次求解
    pub captcha_solve_retry: RetryPolicy,
    pub browser: BrowserSettings,
}

/// 门户地址与页面选择器
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// 门户首页
    pub base_url: String,
    /// 登录成功后的 URL 前缀
    pub landing_url_prefix: String,
    pub login_trigger_selector: String,
    /// 登录页标题文字
    pub login_heading_text: String,
    pub captcha_field_selector: String,
    pub username_selector: String,
    pub password_selector: String,
}

/// 各步骤的等待上限（毫秒）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StepTimeouts {
    pub form_ms: u64,
    pub navigation_ms: u64,
    pub captcha_field_ms: u64,
    pub network_idle_ms: u64,
    pub error_probe_ms: u64,
}

/// 重试策略
///
/// `max_attempts` 为 `None` 时不限次数，只能由请求超时或取消终止。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub backoff_ms: u64,
}

/// 浏览器启动参数
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// 指定浏览器可执行文件，留空则由 chromiumoxide 自动查找
    pub executable: Option<String>,
    /// 每个会话随机挑选一个
    pub user_agents: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            scripts_dir: "utilities".to_string(),
            request_timeout_ms: 180_000,
            portal: PortalConfig::default(),
            timeouts: StepTimeouts::default(),
            captcha_field_retry: RetryPolicy::unbounded(Duration::ZERO),
            captcha_solve_retry: RetryPolicy::bounded(5, Duration::from_millis(500)),
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vtop.vit.ac.in/vtop/content".to_string(),
            landing_url_prefix: "https://vtop.vit.ac.in/vtop/content".to_string(),
            login_trigger_selector: "#stdForm".to_string(),
            login_heading_text: "VTOP Login".to_string(),
            captcha_field_selector: "#captchaStr".to_string(),
            username_selector: "#username".to_string(),
            password_selector: "#password".to_string(),
        }
    }
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            form_ms: 5_000,
            navigation_ms: 5_000,
            captcha_field_ms: 1_000,
            network_idle_ms: 3_000,
            error_probe_ms: 500,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::ZERO)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.2227.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36".to_string(),
            ],
        }
    }
}

impl RetryPolicy {
    pub fn bounded(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    pub fn unbounded(backoff: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// 已经尝试 `attempts` 次后是否还能再试
    pub fn allows_another(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }
}

impl StepTimeouts {
    pub fn form(&self) -> Duration {
        Duration::from_millis(self.form_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn captcha_field(&self) -> Duration {
        Duration::from_millis(self.captcha_field_ms)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    pub fn error_probe(&self) -> Duration {
        Duration::from_millis(self.error_probe_ms)
    }
}

impl Config {
    /// 加载配置：`VTOP_CONFIG` 指定的文件（默认 `vtop.toml`，不存在则跳过），再叠加环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("VTOP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        base.apply_env(|name| std::env::var(name).ok())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|name| std::env::var(name).ok())
    }

    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    }

    /// 用环境变量覆盖配置
    pub fn apply_env<F>(mut self, get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = get("SCRIPTS_DIR") {
            self.scripts_dir = v;
        }
        if let Some(v) = get("PORTAL_BASE_URL") {
            self.portal.base_url = v;
        }
        if let Some(v) = get("PORTAL_LANDING_URL_PREFIX") {
            self.portal.landing_url_prefix = v;
        }
        if let Some(v) = get("BROWSER_EXECUTABLE") {
            self.browser.executable = Some(v);
        }
        if let Some(v) = get("REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_env("REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("BROWSER_HEADLESS") {
            self.browser.headless = parse_env("BROWSER_HEADLESS", &v)?;
        }
        if let Some(v) = get("CAPTCHA_MAX_RETRIES") {
            self.captcha_solve_retry.max_attempts = Some(parse_env("CAPTCHA_MAX_RETRIES", &v)?);
        }
        if let Some(v) = get("CAPTCHA_FIELD_MAX_RELOADS") {
            self.captcha_field_retry.max_attempts = Some(parse_env("CAPTCHA_FIELD_MAX_RELOADS", &v)?);
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected_type: std::any::type_name::<T>().to_string(),
    })
}
