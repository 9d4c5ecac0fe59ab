use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;

/// 接入浏览器并获取岗位搜索页
///
/// 优先连接已在调试端口上运行、用户已登录的浏览器；
/// 连不上时退回到自托管模式，用持久化用户数据目录启动一个有头浏览器
/// （登录态保存在该目录里，下次启动无需重新登录）
pub async fn attach_to_browser_and_page(config: &Config) -> Result<(Browser, Page)> {
    match connect_to_browser_and_page(config.browser_debug_port, &config.target_url).await {
        Ok(pair) => Ok(pair),
        Err(e) => {
            warn!(
                "连接调试端口 {} 失败（{}），改为自托管浏览器",
                config.browser_debug_port, e
            );
            launch_browser_with_profile(&config.chrome_profile_dir, &config.target_url).await
        }
    }
}

/// 连接到已运行的浏览器并获取页面
async fn connect_to_browser_and_page(port: u16, target_url: &str) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    // 优先复用已经打开的岗位搜索标签页
    let target_host = host_of(target_url);
    for p in pages.iter() {
        if let Ok(Some(url)) = p.url().await {
            debug!("检查页面: {}", url);
            if !target_host.is_empty() && url.contains(&target_host) {
                info!("✓ 找到目标页面: {}", url);
                return Ok((browser, p.clone()));
            }
        }
    }

    // 没有现成的标签页就新开一个并导航过去
    debug!("未找到目标页面，创建新页面并导航到: {}", target_url);
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        e
    })?;
    page.goto(target_url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", target_url, e);
        e
    })?;
    info!("已导航到: {}", target_url);

    Ok((browser, page))
}

/// 用持久化用户数据目录启动有头浏览器并导航到目标页
///
/// 有头是刻意的：用户要在这个窗口里手动登录、设置筛选条件
async fn launch_browser_with_profile(profile_dir: &str, url: &str) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器 (用户数据目录: {})...", profile_dir);

    let browser_config = BrowserConfig::builder()
        .with_head()
        .user_data_dir(profile_dir)
        .args(vec![
            "--no-first-run",
            "--no-default-browser-check",
            "--disable-dev-shm-usage", // 防止共享内存不足
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            anyhow::anyhow!("配置浏览器失败: {}", e)
        })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    info!("✅ 浏览器已导航到: {}", url);

    Ok((browser, page))
}

/// 取 URL 的主机名部分，用于匹配已打开的标签页
fn host_of(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_strips_scheme_and_path() {
        assert_eq!(
            host_of("https://app.joinhandshake.com/job-search"),
            "app.joinhandshake.com"
        );
        assert_eq!(host_of("app.joinhandshake.com"), "app.joinhandshake.com");
        assert_eq!(host_of(""), "");
    }
}
