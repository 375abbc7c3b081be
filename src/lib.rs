//! # VTOP Scraper
//!
//! 通过无头浏览器登录 VTOP 门户，注入脚本抓取学期、考勤、课程、成绩、CGPA 和考试安排。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Browser / Page），只暴露能力
//! - `PortalPage` - 页面能力接口，`ChromiumPage` 为 chromiumoxide 实现
//! - `JsExecutor` - 替换学期 ID、执行脚本、规整返回值
//!
//! ### ② 业务能力层（Services / Scripts）
//! - `services/` - `ErrorClassifier` 识别门户错误提示
//! - `scripts/` - 启动时加载的注入脚本，统一为 `PageScript`
//!
//! ### ③ 流程层（Workflow）
//! - `LoginFlow` - 登录 / 验证码重试状态机
//! - `CollectFlow` - 学期列表 → 五个类别的顺序抓取
//!
//! ### ④ 编排层（Orchestration）
//! - `SessionController` - 一个请求一个浏览器，所有出口都关闭浏览器
//! - `api/` - HTTP 接口
//!
//! ## 模块结构

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod scripts;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, LoginFailure};
pub use infrastructure::{JsExecutor, PortalPage, SessionFactory};
pub use models::{Credentials, DataCategory, ExtractionResult, SemesterSelection};
pub use orchestrator::SessionController;
pub use scripts::ScriptRegistry;
pub use workflow::{CollectFlow, LoginFlow};
