//! 岗位处理流程 - 流程层
//!
//! 定义"一个岗位"从选中到终态的完整流程：
//! 按 id 重新定位 → 选中 → 抽取字段 → 分支判定 →
//! 门槛分类 → 自动投递或留待人工。
//!
//! 每条路径都收敛到唯一的终态；拿不到前置条件（详情面板、表单）
//! 时返回错误，由编排层在岗位边界兜住，下次运行重试。

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::record::{ListingDraft, ListingRecord, Outcome};
use crate::models::rules::RuleTable;
use crate::models::snapshot::PaneSnapshot;
use crate::services::{
    BarrierClassifier, CardScanner, DetailExtractor, Interactor, SubmitOutcome, Submitter,
};
use crate::utils::logging::truncate_text;
use crate::workflow::listing_ctx::ListingCtx;

/// 投递按钮的临时标记值
const APPLY_MARK: &str = "apply";

/// 一个岗位的流程结果
#[derive(Debug)]
pub enum FlowResult {
    /// 到达终态，记录待写入历史库
    Terminal(ListingRecord),
    /// 卡片在动手之前就从渲染中消失了；不写记录，下次运行重试
    Vanished,
}

/// 详情加载后的分支
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// 已经投递过
    AlreadyApplied,
    /// 没有投递入口
    NoApplyPath,
    /// 仅支持外部投递
    ExternalOnly,
    /// 需要打开表单做门槛分类
    NeedsClassification,
}

/// 详情面板快照上的分支判定（纯函数）
///
/// 投递按钮优先于指示短语：岗位列表文案里出现 "applied" 字样
/// 不应该影响还有投递按钮的岗位
pub fn decide_branch(pane: &PaneSnapshot, rules: &RuleTable) -> Branch {
    if !pane.apply_present {
        let text = pane.text.to_lowercase();
        if rules.applied_indicators.iter().any(|p| text.contains(p)) {
            return Branch::AlreadyApplied;
        }
        return Branch::NoApplyPath;
    }

    let label = pane.apply_label.to_lowercase();
    if rules.external_markers.iter().any(|m| label.contains(m)) {
        return Branch::ExternalOnly;
    }

    Branch::NeedsClassification
}

/// 岗位处理流程
///
/// - 编排单个岗位的完整处理
/// - 不持有任何资源（session 由调用方传入）
/// - 只依赖业务能力（services）
pub struct ListingFlow {
    scanner: CardScanner,
    extractor: DetailExtractor,
    classifier: BarrierClassifier,
    submitter: Submitter,
    interactor: Interactor,
    wait_timeout_ms: u64,
    detail_settle_ms: u64,
    modal_settle_ms: u64,
    verbose_logging: bool,
}

impl ListingFlow {
    /// 创建新的岗位处理流程
    pub fn new(config: &Config) -> Self {
        Self {
            scanner: CardScanner::new(),
            extractor: DetailExtractor::new(),
            classifier: BarrierClassifier::new(),
            submitter: Submitter::new(config),
            interactor: Interactor::new(config),
            wait_timeout_ms: config.wait_timeout_ms,
            detail_settle_ms: config.detail_settle_ms,
            modal_settle_ms: config.modal_settle_ms,
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(
        &self,
        session: &Session,
        rules: &RuleTable,
        ctx: &ListingCtx,
    ) -> Result<FlowResult> {
        // ========== 1. 按稳定 id 重新定位卡片 ==========
        if !self.scanner.mark_card(session, rules, &ctx.id).await {
            debug!("{} 卡片已不在当前渲染中", ctx);
            return Ok(FlowResult::Vanished);
        }

        // ========== 2. 选中卡片 ==========
        if !self
            .interactor
            .click_marked(session, crate::services::card_scanner::CARD_MARK)
            .await
            .acted()
        {
            debug!("{} 选中卡片失败，卡片已失效", ctx);
            return Ok(FlowResult::Vanished);
        }

        // 有界等待详情面板出现，再给远端渲染一个静置窗口
        if session
            .wait_for(&rules.detail_pane_selector, self.wait_timeout_ms)
            .await
            .is_none()
        {
            anyhow::bail!("{} 详情面板未出现", ctx);
        }
        session.settle(self.detail_settle_ms).await;

        // ========== 3. 详情面板快照 ==========
        let pane = match self.extractor.pane_snapshot(session, rules).await {
            Some(pane) => pane,
            None => anyhow::bail!("{} 详情面板快照失败", ctx),
        };

        // ========== 4. 字段抽取（失败落占位值，不报错） ==========
        let mut draft = match self.extractor.card_snapshot(session, rules, &ctx.id).await {
            Some(snapshot) => self.extractor.draft_from_card(&snapshot, rules),
            None => ListingDraft::default(),
        };
        self.extractor.enrich_from_pane(&mut draft, &pane.text, rules);
        info!("{} {} - {}", ctx, draft.company, draft.title);

        // ========== 5. 分支判定 ==========
        match decide_branch(&pane, rules) {
            Branch::AlreadyApplied => Ok(self.terminal(ctx, Outcome::Skipped, vec![], draft)),
            Branch::NoApplyPath => Ok(self.terminal(ctx, Outcome::NoApplyPath, vec![], draft)),
            Branch::ExternalOnly => Ok(self.terminal(ctx, Outcome::External, vec![], draft)),
            Branch::NeedsClassification => {
                self.classify_and_submit(session, rules, ctx, draft).await
            }
        }
    }

    /// 打开表单 → 门槛分类 → 自动投递或留待人工
    async fn classify_and_submit(
        &self,
        session: &Session,
        rules: &RuleTable,
        ctx: &ListingCtx,
        draft: ListingDraft,
    ) -> Result<FlowResult> {
        // 打开投递表单
        let mark = self
            .interactor
            .mark_button(
                session,
                Some(rules.detail_pane_selector.as_str()),
                &rules.apply_button_text,
                Some("applied"),
                APPLY_MARK,
            )
            .await;
        match mark {
            Some(m) if m.found => {}
            _ => anyhow::bail!("{} 投递按钮定位失败", ctx),
        }
        if !self
            .interactor
            .click_marked(session, APPLY_MARK)
            .await
            .acted()
        {
            anyhow::bail!("{} 投递按钮点击失败", ctx);
        }

        // 有界等待表单容器出现
        if session
            .wait_for(&rules.form_selector, self.wait_timeout_ms)
            .await
            .is_none()
        {
            self.interactor.clear_overlays(session, rules).await;
            anyhow::bail!("{} 投递表单未出现", ctx);
        }
        session.settle(self.modal_settle_ms).await;

        // 表单快照；拿不到就无法分类，留给下次运行
        let form = match self.classifier.snapshot(session, rules).await {
            Some(form) => form,
            None => {
                self.interactor.clear_overlays(session, rules).await;
                anyhow::bail!("{} 表单快照失败", ctx);
            }
        };
        if self.verbose_logging {
            debug!("{} 表单预览: {}", ctx, truncate_text(&form.text, 120));
        }

        // 门槛分类
        let barriers = self.classifier.classify(&form, rules);
        if !barriers.is_empty() {
            // 有门槛：关掉表单，留待人工
            self.interactor.clear_overlays(session, rules).await;
            return Ok(self.terminal(ctx, Outcome::Saved, barriers, draft));
        }

        // 无门槛：尝试自动投递
        match self
            .submitter
            .submit(session, &self.interactor, rules, &form)
            .await
        {
            SubmitOutcome::Applied => Ok(self.terminal(ctx, Outcome::Applied, vec![], draft)),
            SubmitOutcome::Failed(reason) => {
                warn!("{} ⚠️ 投递失败: {}", ctx, reason);
                self.interactor.clear_overlays(session, rules).await;
                Ok(self.terminal(ctx, Outcome::Failed, vec![], draft))
            }
        }
    }

    fn terminal(
        &self,
        ctx: &ListingCtx,
        outcome: Outcome,
        barriers: Vec<crate::models::record::Barrier>,
        draft: ListingDraft,
    ) -> FlowResult {
        FlowResult::Terminal(ListingRecord::new(ctx.id.clone(), outcome, barriers, draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane(text: &str, present: bool, label: &str) -> PaneSnapshot {
        PaneSnapshot {
            text: text.to_string(),
            apply_present: present,
            apply_label: label.to_string(),
            apply_disabled: false,
        }
    }

    #[test]
    fn no_button_with_indicator_means_already_applied() {
        let rules = RuleTable::default();
        let snapshot = pane("You applied on May 3. Withdraw Application", false, "");
        assert_eq!(decide_branch(&snapshot, &rules), Branch::AlreadyApplied);
    }

    #[test]
    fn no_button_without_indicator_means_no_apply_path() {
        let rules = RuleTable::default();
        let snapshot = pane("This posting has expired.", false, "");
        assert_eq!(decide_branch(&snapshot, &rules), Branch::NoApplyPath);
    }

    #[test]
    fn external_label_short_circuits_classification() {
        let rules = RuleTable::default();
        let snapshot = pane("Great job", true, "Apply externally on employer site");
        assert_eq!(decide_branch(&snapshot, &rules), Branch::ExternalOnly);
    }

    #[test]
    fn plain_apply_button_goes_to_classification() {
        let rules = RuleTable::default();
        let snapshot = pane("Great job, 12 students applied", true, "Apply to Acme Corp");
        // 面板文案里出现 applied 字样不影响还有投递按钮的岗位
        assert_eq!(decide_branch(&snapshot, &rules), Branch::NeedsClassification);
    }
}
