use handshake_auto_apply::models::record::{ListingDraft, ListingRecord, Outcome};
use handshake_auto_apply::services::{HistoryStore, RateLimiter};
use handshake_auto_apply::utils::logging;
use handshake_auto_apply::Config;

/// 幂等续跑：历史库里已有 N 条终态记录时，重启后同一批 id 全部被过滤，
/// 不会产生重复记录
#[test]
fn resume_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("application_log.csv");

    let ids = ["100", "101", "102"];
    {
        let mut store = HistoryStore::open(&path).unwrap();
        for id in ids {
            store.record(&ListingRecord::new(
                id.to_string(),
                Outcome::Saved,
                vec![],
                ListingDraft::default(),
            ));
        }
    }

    // 模拟重启：重新打开，同一批 id 再记一遍
    let mut store = HistoryStore::open(&path).unwrap();
    for id in ids {
        assert!(store.contains(id));
        store.record(&ListingRecord::new(
            id.to_string(),
            Outcome::Applied,
            vec![],
            ListingDraft::default(),
        ));
    }

    let content = std::fs::read_to_string(store.path()).unwrap();
    let data_rows = content.lines().skip(1).filter(|l| !l.is_empty()).count();
    assert_eq!(data_rows, ids.len());
}

/// 启动即满额：窗口内 Applied 记录达到上限时，限频器从第一刻起就熄火
#[test]
fn startup_rate_ceiling_blocks_the_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("application_log.csv");

    let mut store = HistoryStore::open(&path).unwrap();
    for id in 0..5 {
        store.record(&ListingRecord::new(
            id.to_string(),
            Outcome::Applied,
            vec![],
            ListingDraft::default(),
        ));
    }

    let limiter = RateLimiter::from_store(&store, 5, 24).unwrap();
    assert!(limiter.exhausted());
}

// ========== 以下测试需要一个已登录的真实浏览器 ==========

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_attach() {
    logging::init(true);
    let config = Config::from_env();

    let result = handshake_auto_apply::attach_to_browser_and_page(&config).await;
    assert!(result.is_ok(), "应该能够接入浏览器");
}

#[tokio::test]
#[ignore]
async fn test_scan_current_page() {
    use handshake_auto_apply::models::rules::RuleTable;
    use handshake_auto_apply::services::CardScanner;
    use handshake_auto_apply::Session;

    logging::init(true);
    let config = Config::from_env();
    let rules = RuleTable::default();

    let (_browser, page) = handshake_auto_apply::attach_to_browser_and_page(&config)
        .await
        .expect("接入浏览器失败");
    let session = Session::new(page);

    // 注意：请先在浏览器里登录并打开岗位搜索页
    let scanner = CardScanner::new();
    let cards = scanner.scan(&session, &rules).await;
    println!("当前页扫描到 {} 个岗位", cards.len());
}
