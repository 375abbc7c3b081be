//! API 模块
//!
//! 对外只有一个接口：`GET /vtopdata`

pub mod server;

pub use server::{router, serve, ApiState};
