//! 编排层（Orchestration Layer）
//!
//! ```text
//! api (HTTP 请求)
//!     ↓
//! orchestrator::SessionController (一个请求一个浏览器)
//!     ↓
//! workflow::LoginFlow → workflow::CollectFlow
//!     ↓
//! services / scripts (错误识别、注入脚本)
//!     ↓
//! infrastructure (PortalPage、JsExecutor)
//! ```

pub mod session;

pub use session::SessionController;
