//! 单次请求的输入

use std::fmt;

use serde::Deserialize;

/// 登录凭据
///
/// 只在一次会话内使用，不落盘，`Debug` 输出不包含密码。
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 学期选择（从 0 开始）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SemesterSelection {
    pub sem_index: usize,
}

impl SemesterSelection {
    pub fn new(sem_index: usize) -> Self {
        Self { sem_index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("21BCE0001", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("21BCE0001"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn semester_defaults_to_first() {
        assert_eq!(SemesterSelection::default().sem_index, 0);
    }
}
