use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 页面操作错误
    #[error("页面错误: {0}")]
    Page(#[from] PageError),
    /// 登录流程失败（已分类）
    #[error("登录失败: {0}")]
    Login(#[from] LoginFailure),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 整个请求超时
    #[error("请求超时 (上限 {0:?})")]
    Timeout(Duration),
    /// 请求被取消
    #[error("请求已取消")]
    Cancelled,
}

/// 浏览器生命周期错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(#[source] chromiumoxide::error::CdpError),
    /// 创建页面失败
    #[error("创建页面失败: {0}")]
    PageCreationFailed(#[source] chromiumoxide::error::CdpError),
}

/// 单个页面操作的错误
///
/// `Timeout` 与其他错误分开，登录状态机需要区分“等不到”和“出错了”。
#[derive(Debug, Error)]
pub enum PageError {
    /// 等待超时
    #[error("等待 {what} 超时 ({after:?})")]
    Timeout { what: String, after: Duration },
    /// 导航失败
    #[error("导航到 {url} 失败: {message}")]
    Navigation { url: String, message: String },
    /// 元素不存在或无法操作
    #[error("元素 {selector} 操作失败: {message}")]
    Element { selector: String, message: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {0}")]
    Script(String),
}

impl PageError {
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        PageError::Timeout {
            what: what.into(),
            after,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PageError::Timeout { .. })
    }
}

/// 登录状态机的失败终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginFailure {
    /// 验证码重试次数耗尽
    #[error("验证码重试次数耗尽")]
    CaptchaExhausted,
    /// 门户提示用户名或密码错误
    #[error("用户名或密码错误")]
    InvalidCredentials,
    /// 门户返回了无法识别的错误
    #[error("未知的门户错误")]
    Unknown,
    /// 流程结束但未到达登录后的页面
    #[error("未能确认登录状态")]
    LoginUnverified,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 脚本文件缺失
    #[error("缺少脚本 {name}: {path}")]
    MissingScript { name: String, path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for PageError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        PageError::Script(err.to_string())
    }
}

// ========== 对外暴露的错误描述 ==========

impl AppError {
    /// HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Login(LoginFailure::CaptchaExhausted) => 400,
            AppError::Login(LoginFailure::InvalidCredentials) => 401,
            AppError::Login(LoginFailure::LoginUnverified) => 401,
            AppError::Login(LoginFailure::Unknown) => 500,
            AppError::Timeout(_) => 504,
            AppError::Cancelled => 503,
            _ => 500,
        }
    }

    /// 返回给调用方的 detail 文本
    pub fn detail(&self) -> String {
        match self {
            AppError::Login(LoginFailure::CaptchaExhausted) => "Captcha solving failed.".into(),
            AppError::Login(LoginFailure::InvalidCredentials) => "Invalid credentials.".into(),
            AppError::Login(LoginFailure::LoginUnverified) => "Login failed.".into(),
            AppError::Login(LoginFailure::Unknown) => "Unknown error occurred.".into(),
            AppError::Timeout(_) => "Request timed out.".into(),
            AppError::Cancelled => "Request cancelled.".into(),
            other => format!("Scraping failed: {}", other),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 页面操作结果类型
pub type PageResult<T> = Result<T, PageError>;
