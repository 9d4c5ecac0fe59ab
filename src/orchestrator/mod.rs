//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责逐页推进和资源装配，是整个系统的"指挥中心"。
//!
//! ### `app` - 应用编排
//! - 管理应用生命周期（初始化、运行、收尾）
//! - 持有 Browser / Session / 历史库 / 限频器
//! - 操作员交接（打印说明、等待回车）
//! - 响应中断信号（岗位边界生效）
//! - 输出全局统计信息
//!
//! ### `page_processor` - 单页处理器
//! - 扫描当前页并过滤已处理岗位
//! - 逐个岗位委托 workflow::ListingFlow
//! - 岗位边界兜住单个岗位的失败
//! - 会话级失败的刷新重扫（每页至多一次）
//! - 翻页决策
//!
//! ## 层次关系
//!
//! ```text
//! app (逐页推进)
//!     ↓
//! page_processor (处理一页的岗位)
//!     ↓
//! workflow::ListingFlow (处理单个岗位)
//!     ↓
//! services (能力层：扫描 / 抽取 / 分类 / 投递 / 历史 / 限频)
//!     ↓
//! infrastructure (基础设施：Session)
//! ```

pub mod app;
pub mod page_processor;

pub use app::App;
pub use page_processor::{PageCycle, RunStats};
