pub mod connection;
pub mod headless;

use std::time::Duration;

use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{BrowserMode, Config};
use crate::error::{AppError, AppResult, BrowserError};

pub use connection::connect_to_browser_and_page;
pub use headless::{launch_browser, LaunchSettings};

/// 浏览器资源的唯一持有者
///
/// 自己启动的浏览器在退出时关闭；连接上的浏览器属于用户，只断开连接。
pub struct BrowserHandle {
    browser: Browser,
    launched: bool,
    handler_task: JoinHandle<()>,
}

impl BrowserHandle {
    /// 按配置获取浏览器和工作页面
    pub async fn acquire(config: &Config) -> AppResult<(Self, Page)> {
        match config.browser_mode {
            BrowserMode::Connect => {
                let host = url::Url::parse(&config.site_url)
                    .ok()
                    .and_then(|u| u.host_str().map(|h| h.to_string()));
                let (browser, page, handler_task) =
                    connect_to_browser_and_page(config.browser_debug_port, host.as_deref())
                        .await
                        .map_err(|e| AppError::browser_connection_failed(config.browser_debug_port, AnyhowSource(e)))?;
                Ok((
                    Self {
                        browser,
                        launched: false,
                        handler_task,
                    },
                    page,
                ))
            }
            BrowserMode::Launch => {
                let settings = LaunchSettings {
                    headless: config.headless,
                    chrome_executable: config.chrome_executable.clone(),
                    user_data_dir: config.chrome_user_data_dir.clone(),
                };
                let (browser, page, handler_task) = launch_browser(&settings).await.map_err(|e| {
                    AppError::Browser(BrowserError::LaunchFailed {
                        source: Box::new(AnyhowSource(e)),
                    })
                })?;
                Ok((
                    Self {
                        browser,
                        launched: true,
                        handler_task,
                    },
                    page,
                ))
            }
        }
    }

    /// 关闭浏览器（仅限自己启动的）并停止事件处理任务
    pub async fn shutdown(mut self) {
        if self.launched {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器退出失败: {}", e);
            }
            info!("✓ 浏览器已关闭");
        } else {
            info!("✓ 已断开与浏览器的连接");
        }
        self.handler_task.abort();
    }
}

/// 浏览器连上后等待标签页状态同步的时间
const SYNC_DELAY: Duration = Duration::from_millis(300);

/// 在后台消费浏览器事件，等状态同步后返回任务句柄
pub(crate) async fn spawn_event_loop(mut handler: Handler) -> JoinHandle<()> {
    let task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });
    tokio::time::sleep(SYNC_DELAY).await;
    task
}

/// 让 anyhow::Error 可以放进 `Box<dyn Error>` 字段
#[derive(Debug)]
struct AnyhowSource(anyhow::Error);

impl std::fmt::Display for AnyhowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

impl std::error::Error for AnyhowSource {}
