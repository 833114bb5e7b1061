use anyhow::Result;
use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::spawn_event_loop;

/// 连接到以远程调试端口启动的浏览器并获取页面
///
/// 优先复用 URL 包含 `site_host` 的已有标签页（通常已经登录），
/// 找不到时新建空白页。
pub async fn connect_to_browser_and_page(
    port: u16,
    site_host: Option<&str>,
) -> Result<(Browser, Page, JoinHandle<()>)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    let handler_task = spawn_event_loop(handler).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    if let Some(host) = site_host {
        for p in pages.iter() {
            if let Ok(Some(url)) = p.url().await {
                debug!("检查页面: {}", url);
                if url.contains(host) {
                    info!("✓ 复用已有页面: {}", url);
                    return Ok((browser, p.clone(), handler_task));
                }
            }
        }
        debug!("未找到匹配的页面，将创建新页面");
    }

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建空白页面失败: {}", e);
        e
    })?;

    Ok((browser, page, handler_task))
}
