//! 会话 - 基础设施层
//!
//! 持有唯一的 page 资源，只向上暴露能力：
//! 导航 / 刷新 / 查找元素 / 执行脚本 / 有界等待。
//! 其他任何组件都不直接接触 Page。

use anyhow::Result;
use chromiumoxide::{Element, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 等待元素时的轮询间隔
const POLL_INTERVAL_MS: u64 = 250;

/// 浏览器会话
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露查找 / 点击前提 / 脚本执行能力
/// - 不认识岗位、表单等业务概念
pub struct Session {
    page: Page,
}

impl Session {
    /// 创建新的会话
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（仅供集成测试使用）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 导航到指定 URL
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    /// 刷新当前页面（会话级恢复路径）
    pub async fn refresh(&self) -> Result<()> {
        self.page.reload().await?;
        Ok(())
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 查找第一个匹配元素
    ///
    /// 未找到返回 None；会话本身是否健康用 `is_alive` 单独探测
    pub async fn find(&self, selector: &str) -> Option<Element> {
        self.page.find_element(selector).await.ok()
    }

    /// 查找所有匹配元素，失败时返回空列表
    pub async fn find_all(&self, selector: &str) -> Vec<Element> {
        self.page.find_elements(selector).await.unwrap_or_default()
    }

    /// 有界等待元素出现
    ///
    /// 超时是正常结果（返回 None），不是需要向上传播的异常
    pub async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Option<Element> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Some(element) = self.find(selector).await {
                return Some(element);
            }
            if tokio::time::Instant::now() >= deadline {
                debug!("等待元素超时: {} ({}ms)", selector, timeout_ms);
                return None;
            }
            sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    /// 固定静置窗口，等远端异步重渲染完成
    pub async fn settle(&self, ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }

    /// 向页面发送 Escape（尽力而为，失败静默）
    pub async fn press_escape(&self) {
        if let Some(body) = self.find("body").await {
            if let Err(e) = body.press_key("Escape").await {
                debug!("发送 Escape 失败: {}", e);
            }
        }
    }

    /// 探测会话是否还活着
    pub async fn is_alive(&self) -> bool {
        matches!(
            self.eval("1 + 1").await,
            Ok(JsonValue::Number(n)) if n.as_i64() == Some(2)
        )
    }
}
