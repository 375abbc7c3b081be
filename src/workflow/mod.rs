pub mod collect_flow;
pub mod login_flow;

pub use collect_flow::CollectFlow;
pub use login_flow::{LoginFlow, LoginReport, LoginState};
