//! 日志工具模块
//!
//! tracing 订阅器初始化和少量格式化辅助

use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// RUST_LOG 优先；未设置时 verbose 决定 info / debug
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复调用（比如多个测试里）不算错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefgh", 3), "abc...");
        assert_eq!(truncate_text("投递日志预览", 2), "投递...");
    }
}
