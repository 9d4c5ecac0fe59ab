/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 连接失败时自托管浏览器使用的用户数据目录（保存登录态）
    pub chrome_profile_dir: String,
    /// 目标URL（岗位搜索页）
    pub target_url: String,
    /// 历史库文件
    pub store_file: String,
    /// 站点规则文件（存在时覆盖内置规则）
    pub rules_file: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 投递限额 ---
    /// 滚动窗口内允许的投递成功上限
    pub apply_ceiling: usize,
    /// 滚动窗口长度（小时）
    pub apply_window_hours: i64,
    // --- 等待与静置窗口（毫秒） ---
    /// 等待元素出现的默认超时
    pub wait_timeout_ms: u64,
    /// 单个 UI 动作前后的短静置
    pub action_settle_ms: u64,
    /// 选中卡片后等详情面板渲染
    pub detail_settle_ms: u64,
    /// 打开投递表单后等弹层渲染
    pub modal_settle_ms: u64,
    /// 点击提交后等结果渲染
    pub submit_settle_ms: u64,
    /// 翻页后等新页内容渲染
    pub page_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            chrome_profile_dir: "chrome_profile".to_string(),
            target_url: "https://app.joinhandshake.com/job-search".to_string(),
            store_file: "application_log.csv".to_string(),
            rules_file: "rules.toml".to_string(),
            output_log_file: "run_log.txt".to_string(),
            verbose_logging: false,
            apply_ceiling: 25,
            apply_window_hours: 24,
            wait_timeout_ms: 5000,
            action_settle_ms: 400,
            detail_settle_ms: 2000,
            modal_settle_ms: 1500,
            submit_settle_ms: 3000,
            page_settle_ms: 5000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            chrome_profile_dir: std::env::var("CHROME_PROFILE_DIR").unwrap_or(default.chrome_profile_dir),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            store_file: std::env::var("STORE_FILE").unwrap_or(default.store_file),
            rules_file: std::env::var("RULES_FILE").unwrap_or(default.rules_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            apply_ceiling: std::env::var("APPLY_CEILING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.apply_ceiling),
            apply_window_hours: std::env::var("APPLY_WINDOW_HOURS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.apply_window_hours),
            wait_timeout_ms: std::env::var("WAIT_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.wait_timeout_ms),
            action_settle_ms: std::env::var("ACTION_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.action_settle_ms),
            detail_settle_ms: std::env::var("DETAIL_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.detail_settle_ms),
            modal_settle_ms: std::env::var("MODAL_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.modal_settle_ms),
            submit_settle_ms: std::env::var("SUBMIT_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_settle_ms),
            page_settle_ms: std::env::var("PAGE_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_settle_ms),
        }
    }
}
