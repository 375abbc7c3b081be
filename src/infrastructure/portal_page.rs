//! 页面能力接口
//!
//! 登录状态机和数据流水线只依赖这个 trait，不直接接触 chromiumoxide。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{AppResult, PageResult};

/// 一个已打开的门户页面（连同它所属的浏览器上下文）
#[async_trait]
pub trait PortalPage: Send + Sync {
    /// 导航到指定 URL，等待 DOMContentLoaded
    async fn goto(&self, url: &str) -> PageResult<()>;

    /// 等待选择器对应的元素可见
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> PageResult<()>;

    /// 等待页面可见文本中出现指定文字
    async fn wait_for_text(&self, text: &str, timeout: Duration) -> PageResult<()>;

    /// 点击元素并等待由此触发的导航完成
    async fn click_and_wait_for_navigation(&self, selector: &str, timeout: Duration) -> PageResult<()>;

    /// 刷新当前页面
    async fn reload(&self) -> PageResult<()>;

    /// 填写输入框
    async fn fill(&self, selector: &str, value: &str) -> PageResult<()>;

    /// 在页面上下文中执行脚本，返回值按 JSON 取回；`undefined` 视为 `null`
    async fn evaluate(&self, script: &str) -> PageResult<JsonValue>;

    /// 读取 body 的可见文本
    async fn body_text(&self, timeout: Duration) -> PageResult<String>;

    /// 等待网络/DOM 静止
    async fn wait_for_network_idle(&self, timeout: Duration) -> PageResult<()>;

    /// 当前 URL
    async fn current_url(&self) -> PageResult<String>;

    /// 释放页面及其浏览器资源
    async fn close(&self) -> PageResult<()>;
}

/// 为每个请求打开一个独立的页面
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> AppResult<Box<dyn PortalPage>>;
}
