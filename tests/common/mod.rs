//! 测试用的内存门户页面
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use vtop_scraper::config::RetryPolicy;
use vtop_scraper::error::{AppResult, PageError, PageResult};
use vtop_scraper::{Config, PortalPage, ScriptRegistry, SessionFactory};

pub const SOLVER_MARKER: &str = "__CAPTCHA_SOLVER__";
pub const LOGIN_PAGE_URL: &str = "https://vtop.vit.ac.in/vtop/login";
pub const LANDING_URL: &str = "https://vtop.vit.ac.in/vtop/content?dashboard";

/// 每次求解验证码之后页面的样子
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    /// 跳转到登录后区域
    Success,
    /// 没有错误提示，也没有跳转
    Stay,
    /// 页面显示这段文字
    Body(&'static str),
}

/// 脚本的返回
#[derive(Debug, Clone)]
pub enum ScriptReply {
    Value(JsonValue),
    Fail(&'static str),
}

#[derive(Debug, Default)]
pub struct MockState {
    pub url: String,
    pub body: String,
    pub trigger_missing: bool,
    pub navigation_times_out: bool,
    pub heading_missing: bool,
    /// 浏览器启动一直不返回
    pub open_hangs: bool,
    pub body_read_times_out: bool,
    pub captcha_field_misses: u32,
    pub solve_outcomes: VecDeque<SolveOutcome>,
    pub scripts: Vec<(&'static str, ScriptReply)>,

    pub solver_calls: u32,
    pub reloads: u32,
    pub close_calls: u32,
    pub evaluated: Vec<String>,
    pub filled: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockPortal {
    state: Arc<Mutex<MockState>>,
}

impl MockPortal {
    pub fn new() -> Self {
        let portal = Self::default();
        portal.with(|s| {
            s.scripts = default_script_replies();
        });
        portal
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn solve_outcomes(self, outcomes: impl IntoIterator<Item = SolveOutcome>) -> Self {
        self.with(|s| s.solve_outcomes = outcomes.into_iter().collect());
        self
    }

    pub fn reply(self, marker: &'static str, reply: ScriptReply) -> Self {
        self.with(|s| {
            s.scripts.retain(|(m, _)| *m != marker);
            s.scripts.push((marker, reply));
        });
        self
    }

    pub fn solver_calls(&self) -> u32 {
        self.with(|s| s.solver_calls)
    }

    pub fn reloads(&self) -> u32 {
        self.with(|s| s.reloads)
    }

    pub fn close_calls(&self) -> u32 {
        self.with(|s| s.close_calls)
    }

    /// 含有 `marker` 的已执行脚本
    pub fn evaluated_with(&self, marker: &str) -> Vec<String> {
        self.with(|s| {
            s.evaluated
                .iter()
                .filter(|script| script.contains(marker))
                .cloned()
                .collect()
        })
    }

    pub fn evaluated(&self) -> Vec<String> {
        self.with(|s| s.evaluated.clone())
    }
}

fn default_script_replies() -> Vec<(&'static str, ScriptReply)> {
    vec![
        (
            "SEMESTER",
            ScriptReply::Value(json!({
                "semesters": [
                    {"id": "VL20242505", "name": "Winter Semester 2024-25"},
                    {"id": "VL20242501", "name": "Fall Semester 2024-25"}
                ]
            })),
        ),
        ("ATTENDANCE", ScriptReply::Value(json!([{"course": "CSE1001", "percent": 92}]))),
        ("COURSE", ScriptReply::Value(json!("{\"courses\": [\"CSE1001\"]}"))),
        ("MARKS", ScriptReply::Value(json!({"CSE1001": {"cat1": 45}}))),
        ("CGPA", ScriptReply::Value(json!({"cgpa": 8.91}))),
        ("EXAM_SCHEDULE", ScriptReply::Value(json!([{"slot": "A1", "date": "2025-05-02"}]))),
    ]
}

async fn yield_briefly() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}

#[async_trait]
impl PortalPage for MockPortal {
    async fn goto(&self, url: &str) -> PageResult<()> {
        self.with(|s| s.url = url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> PageResult<()> {
        let missed = self.with(|s| match selector {
            "#stdForm" => s.trigger_missing,
            "#captchaStr" if s.captcha_field_misses > 0 => {
                s.captcha_field_misses -= 1;
                true
            }
            _ => false,
        });
        if missed {
            yield_briefly().await;
            return Err(PageError::timeout(selector, timeout));
        }
        Ok(())
    }

    async fn wait_for_text(&self, text: &str, timeout: Duration) -> PageResult<()> {
        if self.with(|s| s.heading_missing) {
            yield_briefly().await;
            return Err(PageError::timeout(text, timeout));
        }
        Ok(())
    }

    async fn click_and_wait_for_navigation(&self, selector: &str, timeout: Duration) -> PageResult<()> {
        if self.with(|s| s.navigation_times_out) {
            yield_briefly().await;
            return Err(PageError::timeout(format!("点击 {} 后的跳转", selector), timeout));
        }
        self.with(|s| s.url = LOGIN_PAGE_URL.to_string());
        Ok(())
    }

    async fn reload(&self) -> PageResult<()> {
        self.with(|s| s.reloads += 1);
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> PageResult<()> {
        self.with(|s| s.filled.insert(selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> PageResult<JsonValue> {
        yield_briefly().await;
        self.with(|s| {
            s.evaluated.push(script.to_string());

            if script.contains(SOLVER_MARKER) {
                s.solver_calls += 1;
                match s.solve_outcomes.pop_front().unwrap_or(SolveOutcome::Success) {
                    SolveOutcome::Success => {
                        s.url = LANDING_URL.to_string();
                        s.body = "Welcome to VTOP".to_string();
                    }
                    SolveOutcome::Stay => s.body = "VTOP Login".to_string(),
                    SolveOutcome::Body(text) => s.body = text.to_string(),
                }
                return Ok(JsonValue::Null);
            }

            match s.scripts.iter().find(|(marker, _)| script.contains(marker)) {
                Some((_, ScriptReply::Value(v))) => Ok(v.clone()),
                Some((_, ScriptReply::Fail(msg))) => Err(PageError::Script(msg.to_string())),
                None => Ok(JsonValue::Null),
            }
        })
    }

    async fn body_text(&self, timeout: Duration) -> PageResult<String> {
        self.with(|s| {
            if s.body_read_times_out {
                Err(PageError::timeout("body", timeout))
            } else {
                Ok(s.body.clone())
            }
        })
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> PageResult<()> {
        Err(PageError::timeout("网络静止", timeout))
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.with(|s| s.url.clone()))
    }

    async fn close(&self) -> PageResult<()> {
        self.with(|s| s.close_calls += 1);
        Ok(())
    }
}

/// 每次 `open` 都返回同一个 MockPortal 的克隆
pub struct MockFactory {
    pub portal: MockPortal,
}

#[async_trait]
impl SessionFactory for MockFactory {
    async fn open(&self) -> AppResult<Box<dyn PortalPage>> {
        if self.portal.with(|s| s.open_hangs) {
            std::future::pending::<()>().await;
        }
        Ok(Box::new(self.portal.clone()))
    }
}

/// 脚本内容里带着 MockPortal 能识别的标记
pub fn registry() -> ScriptRegistry {
    let sources: HashMap<String, String> = [
        ("captcha_solver", format!("/* {} */ solveCaptcha();", SOLVER_MARKER)),
        ("semester", "/* SEMESTER */ listSemesters();".to_string()),
        ("Attendance", "/* ATTENDANCE */ loadAttendance(semId);".to_string()),
        ("Course", "/* COURSE */ const semIdentifier = 1; loadCourses(semId);".to_string()),
        ("Marks", "/* MARKS */ loadMarks(semId);".to_string()),
        ("CGPA", "/* CGPA */ loadCgpa();".to_string()),
        ("ExamSchedule", "/* EXAM_SCHEDULE */ loadSchedule(semId);".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    ScriptRegistry::from_sources(sources).unwrap()
}

/// 去掉等待的配置
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.captcha_solve_retry = RetryPolicy::bounded(5, Duration::ZERO);
    config.captcha_field_retry = RetryPolicy::unbounded(Duration::ZERO);
    config.request_timeout_ms = 5_000;
    config
}
