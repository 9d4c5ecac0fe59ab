//! 单页处理器 - 编排层
//!
//! 负责一页的完整周期：扫描 → 过滤已处理 → 逐个岗位走流程 →
//! 重扫直到没有未处理岗位 → 翻页决策。
//!
//! 错误按层级兜住：单个岗位的失败记日志、清遮罩、继续下一个；
//! 会话级失败刷新当前页从头重扫，且每页最多刷新一次，再失败就
//! 放弃当前页。

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::record::{ListingRecord, Outcome};
use crate::models::rules::RuleTable;
use crate::services::paginator::{decide, PageDecision};
use crate::services::{CardScanner, HistoryStore, Interactor, Paginator, RateLimiter};
use crate::workflow::{FlowResult, ListingCtx, ListingFlow};

/// 全局运行统计
#[derive(Debug, Default)]
pub struct RunStats {
    pub applied: usize,
    pub saved: usize,
    pub skipped: usize,
    pub external: usize,
    pub failed: usize,
    pub no_apply_path: usize,
    pub errors: usize,
    pub pages: usize,
}

impl RunStats {
    /// 登记一个终态
    pub fn note(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Saved => self.saved += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::External => self.external += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::NoApplyPath => self.no_apply_path += 1,
        }
    }

    /// 到达终态的岗位总数
    pub fn processed(&self) -> usize {
        self.applied + self.saved + self.skipped + self.external + self.failed + self.no_apply_path
    }
}

/// 一页处理完后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCycle {
    /// 已翻到下一页
    Advanced,
    /// 翻页结束（或放弃），整个运行收尾
    Finished,
    /// 投递上限已满
    RateLimited,
    /// 用户中断
    Interrupted,
}

/// 单页处理所需的全部资源（编排层逐页构造）
pub struct PageContext<'a> {
    pub config: &'a Config,
    pub rules: &'a RuleTable,
    pub session: &'a Session,
    pub flow: &'a ListingFlow,
    pub scanner: &'a CardScanner,
    pub interactor: &'a Interactor,
    pub paginator: &'a Paginator,
    pub store: &'a mut HistoryStore,
    pub limiter: &'a mut RateLimiter,
    pub interrupted: &'a AtomicBool,
}

/// 处理当前页直到没有未处理岗位，然后做翻页决策
pub async fn process_page(
    ctx: &mut PageContext<'_>,
    page_index: usize,
    stats: &mut RunStats,
) -> Result<PageCycle> {
    let mut refreshed = false;

    loop {
        if ctx.interrupted.load(Ordering::SeqCst) {
            return Ok(PageCycle::Interrupted);
        }

        // ========== 扫描当前渲染 ==========
        let cards = ctx.scanner.scan(ctx.session, ctx.rules).await;

        if cards.is_empty() && !ctx.session.is_alive().await {
            if refreshed {
                warn!("⚠️ 刷新后会话仍不可用，放弃当前页");
                return Ok(PageCycle::Finished);
            }
            warn!("⚠️ 会话疑似失联，刷新当前页后重扫");
            let _ = ctx.session.refresh().await;
            ctx.session.settle(ctx.config.page_settle_ms).await;
            refreshed = true;
            continue;
        }

        let total = cards.len();
        let unseen = ctx.scanner.filter_unseen(cards, ctx.store);
        info!(
            "📄 第 {} 页: 渲染 {} 个岗位，未处理 {} 个",
            page_index,
            total,
            unseen.len()
        );

        // ========== 本页耗尽，翻页决策 ==========
        if unseen.is_empty() {
            let next = ctx.paginator.probe(ctx.session, ctx.rules).await;
            return match decide(0, next.as_ref()) {
                PageDecision::Advance => {
                    if ctx
                        .paginator
                        .advance(ctx.session, ctx.interactor, ctx.rules)
                        .await
                    {
                        Ok(PageCycle::Advanced)
                    } else {
                        warn!("⚠️ 翻页动作未生效，结束运行");
                        Ok(PageCycle::Finished)
                    }
                }
                PageDecision::Stop => {
                    info!("已到最后一页");
                    Ok(PageCycle::Finished)
                }
            };
        }

        // ========== 逐个岗位处理 ==========
        for card in unseen {
            if ctx.interrupted.load(Ordering::SeqCst) {
                return Ok(PageCycle::Interrupted);
            }
            if ctx.limiter.exhausted() {
                return Ok(PageCycle::RateLimited);
            }

            let listing = ListingCtx::new(card.id, card.position, page_index);
            match ctx.flow.run(ctx.session, ctx.rules, &listing).await {
                Ok(FlowResult::Terminal(record)) => {
                    log_outcome(&listing, &record);
                    if record.outcome == Outcome::Applied {
                        ctx.limiter.note_applied();
                    }
                    stats.note(record.outcome);
                    // 先落终态再进入下一个岗位
                    ctx.store.record(&record);
                }
                Ok(FlowResult::Vanished) => {
                    debug!("{} 卡片消失，本次不记录", listing);
                }
                Err(e) => {
                    // 单个岗位的失败绝不拖垮整页
                    error!("{} ❌ 处理出错: {}", listing, e);
                    stats.errors += 1;

                    if !ctx.session.is_alive().await {
                        if refreshed {
                            warn!("⚠️ 会话再次失联，放弃当前页");
                            return Ok(PageCycle::Finished);
                        }
                        warn!("⚠️ 会话失联，刷新当前页后从头重扫");
                        let _ = ctx.session.refresh().await;
                        ctx.session.settle(ctx.config.page_settle_ms).await;
                        refreshed = true;
                        break;
                    }

                    ctx.interactor.clear_overlays(ctx.session, ctx.rules).await;
                }
            }
        }
        // 本轮处理完毕（或中途刷新）；重扫确认本页确实耗尽后再翻页
    }
}

/// 每个终态打一行人类可读的状态
fn log_outcome(ctx: &ListingCtx, record: &ListingRecord) {
    let status = match record.outcome {
        Outcome::Applied => "✅ 已投递",
        Outcome::Saved => "📌 留待人工",
        Outcome::Skipped => "⏭️ 跳过（已投递过）",
        Outcome::External => "🔗 仅外部投递",
        Outcome::Failed => "❌ 投递失败",
        Outcome::NoApplyPath => "🚫 无投递入口",
    };
    info!("{} {} {} - {}", ctx, status, record.company, record.title);
    if !record.barriers.is_empty() {
        info!("{}   门槛: {}", ctx, record.barriers_str());
    }
}
