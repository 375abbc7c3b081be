//! 基础设施层
//!
//! 持有稀缺资源（Browser / Page），只暴露能力

pub mod chromium_page;
pub mod js_executor;
pub mod portal_page;

pub use chromium_page::ChromiumPage;
pub use js_executor::JsExecutor;
pub use portal_page::{PortalPage, SessionFactory};
