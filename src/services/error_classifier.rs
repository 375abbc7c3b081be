//! 错误识别服务 - 业务能力层
//!
//! 读取页面可见文本，判断门户给出了哪一类错误提示。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::infrastructure::PortalPage;

/// 门户错误类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    /// 验证码错误
    Captcha,
    /// 登录名或密码错误
    Login,
    /// 凭据无效
    Credentials,
    /// 其他识别器给出的、状态机不认识的错误
    Unrecognized(String),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalError::Captcha => write!(f, "captcha"),
            PortalError::Login => write!(f, "login"),
            PortalError::Credentials => write!(f, "credentials"),
            PortalError::Unrecognized(text) => write!(f, "unrecognized({})", text),
        }
    }
}

/// 错误识别能力
#[async_trait]
pub trait ErrorClassifier: Send + Sync {
    /// 没有错误（或读不到页面）时返回 `None`
    async fn classify(&self, page: &dyn PortalPage) -> Option<PortalError>;
}

/// 按固定短语做子串匹配的识别器
///
/// 短语按顺序检查，先命中的生效。
#[derive(Debug, Clone)]
pub struct PhraseClassifier {
    phrases: Vec<(String, PortalError)>,
    read_timeout: Duration,
}

impl PhraseClassifier {
    pub fn new(phrases: Vec<(String, PortalError)>, read_timeout: Duration) -> Self {
        Self {
            phrases,
            read_timeout,
        }
    }

    /// VTOP 门户的三条提示语
    pub fn vtop(read_timeout: Duration) -> Self {
        Self::new(
            vec![
                ("Invalid Captcha".to_string(), PortalError::Captcha),
                ("Invalid LoginId/Password".to_string(), PortalError::Login),
                ("Invalid credentials.".to_string(), PortalError::Credentials),
            ],
            read_timeout,
        )
    }

    /// 只做文本匹配
    pub fn match_text(&self, body_text: &str) -> Option<PortalError> {
        self.phrases
            .iter()
            .find(|(phrase, _)| body_text.contains(phrase.as_str()))
            .map(|(_, kind)| kind.clone())
    }
}

#[async_trait]
impl ErrorClassifier for PhraseClassifier {
    async fn classify(&self, page: &dyn PortalPage) -> Option<PortalError> {
        match page.body_text(self.read_timeout).await {
            Ok(text) => self.match_text(&text),
            // 错误只有在门户明确显示时才算数
            Err(e) => {
                debug!("读取页面文本失败，按无错误处理: {}", e);
                None
            }
        }
    }
}
