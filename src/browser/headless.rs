use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::spawn_event_loop;

/// 自行启动浏览器时的参数
#[derive(Debug, Clone, Default)]
pub struct LaunchSettings {
    pub headless: bool,
    pub chrome_executable: Option<String>,
    pub user_data_dir: Option<String>,
}

/// 启动浏览器并打开一个空白页
pub async fn launch_browser(settings: &LaunchSettings) -> Result<(Browser, Page, JoinHandle<()>)> {
    info!(
        "🚀 启动浏览器 ({})...",
        if settings.headless { "无头" } else { "有界面" }
    );

    let mut builder = BrowserConfig::builder();
    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = &settings.chrome_executable {
        debug!("Chrome 路径: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }
    if let Some(dir) = &settings.user_data_dir {
        debug!("用户数据目录: {}", dir);
        builder = builder.user_data_dir(Path::new(dir));
    }

    let config = builder
        .args(vec![
            "--disable-gpu",
            "--no-first-run",
            "--no-default-browser-check",
            "--disable-dev-shm-usage",
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            anyhow::anyhow!("配置浏览器失败: {}", e)
        })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    let handler_task = spawn_event_loop(handler).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    Ok((browser, page, handler_task))
}
