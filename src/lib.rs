//! # Handshake Auto Apply
//!
//! 一个在岗位搜索页上无人值守投递的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `Session` - 唯一的 page owner，提供查找 / 脚本 / 有界等待能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个岗位
//! - `HistoryStore` - 只追加的历史库，去重和限频的依据
//! - `Interactor` - 韧性点击与遮罩清理
//! - `CardScanner` - 卡片枚举、稳定 id、按 id 重定位
//! - `DetailExtractor` - 字段抽取（带优先级回退）
//! - `BarrierClassifier` - 表单门槛判定（出错即关闭）
//! - `Submitter` - 提交与后置条件验证
//! - `Paginator` / `RateLimiter` - 翻页决策与投递限频
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个岗位"的完整处理流程
//! - `ListingCtx` - 上下文封装（页码 + 位置 + 稳定 id）
//! - `ListingFlow` - 流程编排（选中 → 抽取 → 分类 → 投递/留存）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 资源装配、逐页推进、中断与统计
//! - `orchestrator/page_processor` - 单页周期与错误分层兜底
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::attach_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::Session;
pub use models::{Barrier, ListingRecord, Outcome, RuleTable};
pub use orchestrator::App;
pub use services::HistoryStore;
pub use workflow::{FlowResult, ListingCtx, ListingFlow};
