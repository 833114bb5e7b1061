//! 页面通用动作：滚动加载、关闭浮层
//!
//! 都是尽力而为，失败只写 debug 日志。

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::infrastructure::{BrowserSession, ElementHandle, Selector};
use crate::services::locator::{ElementLocator, SemanticTarget};

const SCROLL_LIMIT: u32 = 4000;
const SCROLL_STEP: u32 = 500;

/// 逐段滚动到底部触发懒加载，然后回到顶部
pub async fn load_page<S: BrowserSession>(session: &S, step_delay: Duration) {
    let mut offset = 0;
    while offset < SCROLL_LIMIT {
        if let Err(e) = session
            .execute_script(&format!("window.scrollTo(0, {});", offset))
            .await
        {
            debug!("滚动页面失败: {}", e);
            return;
        }
        offset += SCROLL_STEP;
        sleep(step_delay).await;
    }
    if let Err(e) = session.execute_script("window.scrollTo(0, 0);").await {
        debug!("回到页面顶部失败: {}", e);
    }
}

/// 逐段滚动某个可滚动容器（比如搜索结果列表），让卡片全部渲染出来
pub async fn scroll_container<S: BrowserSession>(session: &S, selector: &Selector, step_delay: Duration) {
    let Selector::Css(css) = selector else {
        debug!("容器滚动只支持 CSS 选择器: {}", selector);
        return;
    };
    let css = match serde_json::to_string(css) {
        Ok(quoted) => quoted,
        Err(_) => return,
    };

    let mut offset = 0;
    while offset < SCROLL_LIMIT {
        let js_code = format!(
            "(() => {{ const el = document.querySelector({}); if (el) {{ el.scrollTo(0, {}); }} }})()",
            css, offset
        );
        if let Err(e) = session.execute_script(&js_code).await {
            debug!("滚动容器失败: {}", e);
            return;
        }
        offset += SCROLL_STEP;
        sleep(step_delay).await;
    }
}

/// 关闭页面上的浮层对话框
///
/// # 返回
/// 关闭的数量
pub async fn dismiss_overlays<S: BrowserSession>(
    session: &S,
    locator: &ElementLocator,
    delay: Duration,
) -> usize {
    let mut closed = 0;
    for button in locator.locate_all(session, SemanticTarget::DismissOverlay).await {
        match button.click().await {
            Ok(()) => {
                closed += 1;
                sleep(delay).await;
            }
            Err(e) => debug!("关闭浮层失败: {}", e),
        }
    }
    if closed > 0 {
        debug!("关闭了 {} 个浮层", closed);
    }
    closed
}
