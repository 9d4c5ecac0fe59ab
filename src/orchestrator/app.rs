//! 应用编排 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源装配和逐页推进。
//!
//! 1. **应用初始化**：打开历史库（失败即致命）、初始化限频器、
//!    加载规则表、接入浏览器、创建 Session
//! 2. **操作员交接**：打印使用说明，等待手动登录和筛选后回车
//! 3. **逐页推进**：把每一页委托给 page_processor，直到翻页结束、
//!    限额用满或用户中断
//! 4. **全局统计**：汇总所有终态并打印，退出前必报历史库位置

use anyhow::Result;
use chromiumoxide::Browser;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::Session;
use crate::models::rules::{load_rules, RuleTable};
use crate::orchestrator::page_processor::{self, PageContext, PageCycle, RunStats};
use crate::services::{CardScanner, HistoryStore, Interactor, Paginator, RateLimiter};
use crate::workflow::ListingFlow;

/// 应用主结构
pub struct App {
    config: Config,
    rules: RuleTable,
    _browser: Browser,
    session: Session,
    store: HistoryStore,
    limiter: RateLimiter,
    flow: ListingFlow,
    scanner: CardScanner,
    interactor: Interactor,
    paginator: Paginator,
}

impl App {
    /// 初始化应用
    ///
    /// 历史库打不开是致命错误；浏览器接不上也是。
    /// 两者都在这里直接向上冒泡，由 main 汇报后退出。
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config);

        // 历史库是一切去重和限频的根基，最先就位
        let store = HistoryStore::open(&config.store_file)?;
        info!("📁 历史库: {}", store.path().display());

        let limiter =
            RateLimiter::from_store(&store, config.apply_ceiling, config.apply_window_hours)?;

        let rules = load_rules(&config.rules_file).await;

        let (browser, page) = browser::attach_to_browser_and_page(&config).await?;
        let session = Session::new(page);

        let flow = ListingFlow::new(&config);
        let scanner = CardScanner::new();
        let interactor = Interactor::new(&config);
        let paginator = Paginator::new(&config);

        Ok(Self {
            config,
            rules,
            _browser: browser,
            session,
            store,
            limiter,
            flow,
            scanner,
            interactor,
            paginator,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        print_instructions();
        wait_for_operator().await?;

        // 启动时窗口已满：一个岗位都不碰，直接收尾
        if self.limiter.exhausted() {
            warn!(
                "⚠️ 投递窗口已满 ({}/{})，本次运行不做任何处理",
                self.limiter.applied(),
                self.limiter.ceiling()
            );
            print_store_location(&self.store);
            return Ok(());
        }

        // 中断信号在岗位边界生效；进行中的单个动作允许做完
        let interrupted = Arc::new(AtomicBool::new(false));
        {
            let flag = interrupted.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("收到中断信号，将在当前岗位收尾后退出");
                    flag.store(true, Ordering::SeqCst);
                }
            });
        }

        let mut stats = RunStats::default();
        let mut page_index = 1usize;

        loop {
            if interrupted.load(Ordering::SeqCst) {
                info!("在岗位边界响应中断");
                break;
            }

            let mut page_ctx = PageContext {
                config: &self.config,
                rules: &self.rules,
                session: &self.session,
                flow: &self.flow,
                scanner: &self.scanner,
                interactor: &self.interactor,
                paginator: &self.paginator,
                store: &mut self.store,
                limiter: &mut self.limiter,
                interrupted: &*interrupted,
            };

            match page_processor::process_page(&mut page_ctx, page_index, &mut stats).await? {
                PageCycle::Advanced => {
                    stats.pages += 1;
                    page_index += 1;
                }
                PageCycle::Finished => break,
                PageCycle::RateLimited => {
                    warn!(
                        "⚠️ 已达投递上限 ({}/{})，干净收尾",
                        self.limiter.applied(),
                        self.limiter.ceiling()
                    );
                    break;
                }
                PageCycle::Interrupted => {
                    info!("在岗位边界响应中断");
                    break;
                }
            }
        }

        print_final_stats(&stats, &self.limiter);
        print_store_location(&self.store);
        Ok(())
    }
}

// ========== 操作员交接 ==========

fn print_instructions() {
    println!("--- 使用说明 ---");
    println!("1. 请在浏览器窗口中手动登录。");
    println!("2. 设置好筛选条件（实习、远程等）。");
    println!("3. 岗位列表就绪后，回到本终端按回车开始。");
    println!("按回车开始自动投递...");
}

async fn wait_for_operator() -> Result<()> {
    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader.read_line(&mut line).await?;
    Ok(())
}

// ========== 日志辅助函数 ==========

fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n岗位投递日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 无人值守投递模式");
    info!(
        "📊 投递上限: {} 次 / {} 小时",
        config.apply_ceiling, config.apply_window_hours
    );
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &RunStats, limiter: &RateLimiter) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已投递: {}", stats.applied);
    info!("📌 留待人工: {}", stats.saved);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("🔗 仅外部投递: {}", stats.external);
    info!("🚫 无投递入口: {}", stats.no_apply_path);
    info!("❌ 投递失败: {}", stats.failed);
    info!("处理出错: {}", stats.errors);
    info!(
        "窗口用量: {}/{} | 本次翻页 {} 次 | 共处理 {} 个岗位",
        limiter.applied(),
        limiter.ceiling(),
        stats.pages,
        stats.processed()
    );
    info!("{}", "=".repeat(60));
}

fn print_store_location(store: &HistoryStore) {
    info!("\n📁 历史库位置: {}", store.path().display());
    println!("历史库位置: {}", store.path().display());
}
