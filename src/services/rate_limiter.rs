//! 投递限频器 - 业务能力层
//!
//! 滚动窗口内投递成功数的硬上限。启动时用历史库里的近期记录做种子，
//! 运行中每次 Applied 终态都计数；到达上限后当前岗位收尾，然后干净退出。

use crate::error::AppResult;
use crate::models::record::Outcome;
use crate::services::history_store::HistoryStore;
use chrono::Duration;
use tracing::info;

/// 投递限频器
pub struct RateLimiter {
    ceiling: usize,
    applied: usize,
}

impl RateLimiter {
    /// 从历史库初始化
    ///
    /// 统计窗口内已有的 Applied 记录作为初始计数，
    /// 跨运行的限频由此得到保证
    pub fn from_store(
        store: &HistoryStore,
        ceiling: usize,
        window_hours: i64,
    ) -> AppResult<Self> {
        let applied = store.count_recent(Outcome::Applied, Duration::hours(window_hours))?;
        info!(
            "限频器就绪: 近 {} 小时已投递 {}/{}",
            window_hours, applied, ceiling
        );
        Ok(Self { ceiling, applied })
    }

    /// 直接用计数构造（测试用）
    #[cfg(test)]
    fn with_counts(ceiling: usize, applied: usize) -> Self {
        Self { ceiling, applied }
    }

    /// 是否已到上限
    ///
    /// 上限是硬性的：返回 true 后编排器不再开始任何新岗位
    pub fn exhausted(&self) -> bool {
        self.applied >= self.ceiling
    }

    /// 登记一次投递成功
    pub fn note_applied(&mut self) {
        self.applied += 1;
    }

    /// 当前窗口内的投递成功数
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// 上限值
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}
