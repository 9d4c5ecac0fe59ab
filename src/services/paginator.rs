//! 翻页控制 - 业务能力层
//!
//! 只在当前页的未处理岗位全部耗尽之后才考虑翻页；
//! 下一页控件缺失或被禁用即终止。

use tracing::{debug, info};

use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::rules::RuleTable;
use crate::services::interaction::Interactor;

/// 翻页决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    /// 前进到下一页
    Advance,
    /// 终止运行
    Stop,
}

/// 下一页控件的探测结果
#[derive(Debug, Clone, Copy)]
pub struct NextControl {
    pub enabled: bool,
}

/// 翻页决策（纯函数）
///
/// 当前页还有未处理岗位时永远不翻页
pub fn decide(unseen_count: usize, next_control: Option<&NextControl>) -> PageDecision {
    if unseen_count > 0 {
        return PageDecision::Stop;
    }
    match next_control {
        Some(control) if control.enabled => PageDecision::Advance,
        _ => PageDecision::Stop,
    }
}

/// 翻页控制器
pub struct Paginator {
    page_settle_ms: u64,
}

impl Paginator {
    pub fn new(config: &Config) -> Self {
        Self {
            page_settle_ms: config.page_settle_ms,
        }
    }

    /// 探测下一页控件
    pub async fn probe(&self, session: &Session, rules: &RuleTable) -> Option<NextControl> {
        let selector = rules.next_button_selector();
        let element = session.find(&selector).await?;

        // disabled 属性或 aria-disabled 任一存在即视为禁用
        let disabled_attr = element.attribute("disabled").await.ok().flatten();
        let aria_disabled = element.attribute("aria-disabled").await.ok().flatten();
        let enabled = disabled_attr.is_none() && aria_disabled.as_deref() != Some("true");

        debug!("下一页控件: enabled={}", enabled);
        Some(NextControl { enabled })
    }

    /// 触发翻页并等新页内容渲染
    pub async fn advance(
        &self,
        session: &Session,
        interactor: &Interactor,
        rules: &RuleTable,
    ) -> bool {
        let selector = rules.next_button_selector();
        if !interactor.click(session, &selector).await.acted() {
            return false;
        }
        info!("➡️ 前往下一页...");
        session.settle(self.page_settle_ms).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_when_next_control_is_absent() {
        assert_eq!(decide(0, None), PageDecision::Stop);
    }

    #[test]
    fn stops_when_next_control_is_disabled() {
        let control = NextControl { enabled: false };
        assert_eq!(decide(0, Some(&control)), PageDecision::Stop);
    }

    #[test]
    fn advances_when_page_is_exhausted_and_control_enabled() {
        let control = NextControl { enabled: true };
        assert_eq!(decide(0, Some(&control)), PageDecision::Advance);
    }

    #[test]
    fn never_advances_while_unseen_items_remain() {
        let control = NextControl { enabled: true };
        assert_eq!(decide(3, Some(&control)), PageDecision::Stop);
    }
}
