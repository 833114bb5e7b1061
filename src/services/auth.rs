//! 登录服务 - 业务能力层
//!
//! 尽力而为：只提交账号密码，不处理验证码和两步验证。

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::infrastructure::{BrowserSession, ElementHandle};
use crate::services::locator::{ElementLocator, SemanticTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// 已提交登录表单
    Submitted,
    /// 没有登录表单，视为已登录
    AlreadySignedIn,
    /// 表单不完整，未提交
    Incomplete,
}

/// 打开登录页并提交账号密码
pub async fn login<S: BrowserSession>(
    session: &S,
    locator: &ElementLocator,
    site_url: &str,
    username: &str,
    password: &str,
    settle: Duration,
) -> Result<LoginOutcome> {
    let url = format!("{}/login", site_url.trim_end_matches('/'));
    info!("🔐 打开登录页: {}", url);
    session
        .navigate(&url)
        .await
        .with_context(|| format!("无法打开登录页: {}", url))?;
    sleep(settle).await;

    let Some(user_field) = locator.locate(session, SemanticTarget::LoginUsername).await else {
        info!("✓ 没有登录表单，沿用已登录状态");
        return Ok(LoginOutcome::AlreadySignedIn);
    };
    let Some(password_field) = locator.locate(session, SemanticTarget::LoginPassword).await else {
        warn!("⚠️ 找不到密码输入框，跳过登录");
        return Ok(LoginOutcome::Incomplete);
    };
    let Some(submit) = locator.locate(session, SemanticTarget::LoginSubmit).await else {
        warn!("⚠️ 找不到登录按钮，跳过登录");
        return Ok(LoginOutcome::Incomplete);
    };

    user_field.clear().await?;
    user_field.send_keys(username).await?;
    password_field.clear().await?;
    password_field.send_keys(password).await?;
    submit.click().await.context("点击登录按钮失败")?;
    sleep(settle).await;

    info!("✓ 已提交登录表单");
    Ok(LoginOutcome::Submitted)
}
