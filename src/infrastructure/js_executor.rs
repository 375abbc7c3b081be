//! JS 执行器 - 基础设施层
//!
//! 只暴露“在页面上执行脚本”的能力：替换学期 ID 占位符、执行、规整返回值。

use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::infrastructure::PortalPage;

/// 脚本中的学期 ID 占位符
pub const SEM_ID_PLACEHOLDER: &str = "semId";

static SEM_ID_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b{}\b", SEM_ID_PLACEHOLDER)).expect("占位符正则无效"));

/// JS 执行器
///
/// 职责：
/// - 借用页面，不持有
/// - 不认识具体的数据类别
/// - 执行失败只记录日志，返回 `None`
pub struct JsExecutor<'a> {
    page: &'a dyn PortalPage,
}

impl<'a> JsExecutor<'a> {
    pub fn new(page: &'a dyn PortalPage) -> Self {
        Self { page }
    }

    /// 执行脚本并规整结果
    ///
    /// # 参数
    /// - `script`: 脚本内容
    /// - `sem_id`: 学期 ID，存在时替换脚本中独立的 `semId`
    ///
    /// # 返回
    /// 成功且非 null 时返回 JSON 值
    pub async fn run(&self, script: &str, sem_id: Option<&str>) -> Option<JsonValue> {
        let script = substitute_sem_id(script, sem_id);
        match self.page.evaluate(&script).await {
            Ok(raw) => normalize_result(raw),
            Err(e) => {
                warn!("执行脚本出错: {}", e);
                None
            }
        }
    }
}

/// 把独立的 `semId` 替换成带引号的字符串字面量
///
/// 只按整词匹配，`semIdentifier`、`mysemId` 不受影响。
pub fn substitute_sem_id(script: &str, sem_id: Option<&str>) -> String {
    match sem_id {
        Some(id) if !id.is_empty() => {
            let literal = JsonValue::String(id.to_string()).to_string();
            debug!("替换 semId -> {}", literal);
            SEM_ID_TOKEN.replace_all(script, NoExpand(&literal)).into_owned()
        }
        _ => script.to_string(),
    }
}

/// 字符串能解析成 JSON 就用解析结果，否则保留原值；null 视为没有结果
pub fn normalize_result(raw: JsonValue) -> Option<JsonValue> {
    let value = match raw {
        JsonValue::String(text) => match serde_json::from_str::<JsonValue>(&text) {
            Ok(parsed) => parsed,
            Err(_) => JsonValue::String(text),
        },
        other => other,
    };
    (!value.is_null()).then_some(value)
}
