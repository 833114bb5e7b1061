//! 职位申请流程 - 流程层
//!
//! 核心职责：定义"一个职位"从打开详情页到终态的完整流程
//!
//! 流程顺序：
//! 1. 打开详情页，滚动加载，关闭浮层
//! 2. 定位申请按钮（找不到 → 已申请 / 无 Easy Apply）
//! 3. 标题黑名单检查（命中则不点击）
//! 4. 脚本点击申请按钮，补填手机号
//! 5. 有上限的步骤循环，直到提交或无法继续

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::infrastructure::{BrowserSession, ElementHandle};
use crate::models::{ApplicationAttempt, ApplyResult};
use crate::services::page_actions::{dismiss_overlays, load_page};
use crate::services::{ElementLocator, FormStepExecutor, SemanticTarget};
use crate::workflow::apply_ctx::ApplyCtx;

const ALREADY_APPLIED_MARKER: &str = "You applied on";
const APPLICATION_SENT_MARKER: &str = "application was sent";

/// 申请流程的参数
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub site_url: String,
    /// 步骤循环的最大轮数
    pub max_form_steps: usize,
    /// 步骤循环的总时限
    pub step_deadline: Duration,
    /// 每次页面操作后的等待
    pub settle: Duration,
    /// 滚动加载时每段的等待
    pub scroll_step: Duration,
    pub black_list_titles: Vec<String>,
    pub resume: Option<PathBuf>,
    pub cover_letter: Option<PathBuf>,
    pub phone_number: String,
}

/// 标题是否命中黑名单关键词（不区分大小写）
pub fn title_is_blacklisted(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && title.contains(&k))
}

/// 单个职位内的步骤循环状态
#[derive(Default)]
struct StepState {
    followed: bool,
    resume_uploaded: bool,
    cover_letter_uploaded: bool,
    /// 已经放弃的问题，同一职位内不再询问
    declined: HashSet<String>,
}

/// 职位申请流程
///
/// - 编排单个职位的完整申请流程
/// - 不持有页面，页面由调用方传入
/// - 只依赖业务能力（services）
pub struct ApplyFlow {
    locator: ElementLocator,
    executor: FormStepExecutor,
    settings: FlowSettings,
}

impl ApplyFlow {
    pub fn new(locator: ElementLocator, executor: FormStepExecutor, settings: FlowSettings) -> Self {
        Self {
            locator,
            executor,
            settings,
        }
    }

    /// 处理一个职位，无论结果如何都返回一条记录
    ///
    /// 流程中的任何错误都降级为 `Abandoned`，不会向上抛出。
    pub async fn process<S: BrowserSession>(&self, session: &S, ctx: &ApplyCtx) -> ApplicationAttempt {
        let result = match self.run(session, ctx).await {
            Ok(result) => result,
            Err(e) => {
                warn!("{} ❌ 处理出错，放弃该职位: {:#}", ctx, e);
                ApplyResult::Abandoned
            }
        };

        let title = session.title().await.unwrap_or_default();

        if matches!(result, ApplyResult::Abandoned | ApplyResult::ClickFailed) {
            self.discard(session, ctx).await;
        }

        match result {
            ApplyResult::Submitted => info!("{} 🎉 申请已提交", ctx),
            other => info!("{} 结果: {}", ctx, other),
        }
        ApplicationAttempt::from_page_title(ctx.job_id.clone(), &title, result)
    }

    async fn run<S: BrowserSession>(&self, session: &S, ctx: &ApplyCtx) -> Result<ApplyResult> {
        // ========== 打开详情页 ==========
        let url = format!(
            "{}/jobs/view/{}/",
            self.settings.site_url.trim_end_matches('/'),
            ctx.job_id
        );
        info!("{} 🌐 打开职位详情页", ctx);
        session
            .navigate(&url)
            .await
            .with_context(|| format!("无法打开职位页面: {}", url))?;
        sleep(self.settings.settle).await;
        load_page(session, self.settings.scroll_step).await;
        dismiss_overlays(session, &self.locator, self.settings.settle / 2).await;

        // ========== 定位申请按钮 ==========
        let Some(apply_button) = self.locator.locate(session, SemanticTarget::ApplyButton).await else {
            let source = session.page_source().await.unwrap_or_default();
            if source.contains(ALREADY_APPLIED_MARKER) {
                info!("{} ✓ 之前已申请过", ctx);
                return Ok(ApplyResult::AlreadyApplied);
            }
            if self.locator.is_present(session, SemanticTarget::ExternalApply).await {
                info!("{} ↗️ 需要去公司网站申请，跳过", ctx);
            } else {
                info!("{} ⚠️ 没有找到 Easy Apply 按钮", ctx);
            }
            return Ok(ApplyResult::NoEasyApply);
        };

        // ========== 标题黑名单 ==========
        let title = session.title().await.unwrap_or_default();
        if title_is_blacklisted(&title, &self.settings.black_list_titles) {
            info!("{} 🚫 标题命中黑名单，跳过: {}", ctx, title);
            return Ok(ApplyResult::Blacklisted);
        }

        // ========== 点击申请按钮 ==========
        info!("{} 🖱️ 点击 Easy Apply", ctx);
        if let Err(e) = apply_button.script_click().await {
            warn!("{} ❌ 点击申请按钮失败: {}", ctx, e);
            return Ok(ApplyResult::ClickFailed);
        }
        sleep(self.settings.settle).await;
        self.executor
            .prefill_contact(session, &self.settings.phone_number)
            .await;

        // ========== 步骤循环 ==========
        Ok(self.step_loop(session, ctx).await)
    }

    async fn step_loop<S: BrowserSession>(&self, session: &S, ctx: &ApplyCtx) -> ApplyResult {
        let deadline = Instant::now() + self.settings.step_deadline;
        let mut state = StepState::default();

        for step in 1..=self.settings.max_form_steps {
            if Instant::now() >= deadline {
                warn!(
                    "{} ⏱️ 表单超过 {} 秒未完成，放弃",
                    ctx,
                    self.settings.step_deadline.as_secs()
                );
                return ApplyResult::Abandoned;
            }
            debug!("{} 表单第 {} 步", ctx, step);

            self.upload_documents(session, ctx, &mut state).await;

            if !state.followed {
                if let Some(follow) = self.locator.locate(session, SemanticTarget::FollowCompany).await {
                    if follow.click().await.is_ok() {
                        debug!("{} 已切换关注公司", ctx);
                    }
                    state.followed = true;
                }
            }

            if self.try_submit(session, ctx).await {
                return ApplyResult::Submitted;
            }

            let groups = self.locator.locate_all(session, SemanticTarget::FieldGroup).await;
            let has_error = self.locator.is_present(session, SemanticTarget::InlineError).await;
            if !groups.is_empty() || has_error {
                let report = self.executor.fill_step(&groups, &state.declined).await;
                if report.all_answered {
                    debug!("{} 本步 {} 个问题已全部回答", ctx, report.answered);
                } else {
                    warn!(
                        "{} ⚠️ 本步有 {} 个问题未回答",
                        ctx,
                        report.unanswered.len()
                    );
                }
                state.declined.extend(report.unanswered);

                if self.try_submit(session, ctx).await {
                    return ApplyResult::Submitted;
                }
            }

            if let Some(next) = self.locator.locate(session, SemanticTarget::NextButton).await {
                if let Err(e) = next.click().await {
                    warn!("{} ❌ 点击下一步失败: {}", ctx, e);
                    return ApplyResult::Abandoned;
                }
                debug!("{} ➡️ 下一步", ctx);
                sleep(self.settings.settle).await;
                continue;
            }

            if let Some(review) = self.locator.locate(session, SemanticTarget::ReviewButton).await {
                if let Err(e) = review.click().await {
                    warn!("{} ❌ 点击检查申请失败: {}", ctx, e);
                    return ApplyResult::Abandoned;
                }
                debug!("{} 🔎 检查申请", ctx);
                sleep(self.settings.settle).await;
                continue;
            }

            info!("{} ⚠️ 没有可继续的控件，放弃", ctx);
            return ApplyResult::Abandoned;
        }

        warn!(
            "{} ⚠️ 表单超过 {} 步仍未提交，放弃",
            ctx, self.settings.max_form_steps
        );
        ApplyResult::Abandoned
    }

    /// 点击提交，或者发现"已发送"标记
    async fn try_submit<S: BrowserSession>(&self, session: &S, ctx: &ApplyCtx) -> bool {
        if let Some(submit) = self.locator.locate(session, SemanticTarget::SubmitButton).await {
            match submit.click().await {
                Ok(()) => {
                    info!("{} 📤 已点击提交", ctx);
                    sleep(self.settings.settle).await;
                    dismiss_overlays(session, &self.locator, self.settings.settle / 2).await;
                    return true;
                }
                Err(e) => warn!("{} ⚠️ 点击提交失败: {}", ctx, e),
            }
        }

        let source = session.page_source().await.unwrap_or_default();
        if source.contains(APPLICATION_SENT_MARKER) {
            info!("{} ✓ 页面显示申请已发送", ctx);
            return true;
        }
        false
    }

    async fn upload_documents<S: BrowserSession>(&self, session: &S, ctx: &ApplyCtx, state: &mut StepState) {
        if !state.resume_uploaded {
            if let Some(path) = &self.settings.resume {
                if let Some(input) = self.locator.locate(session, SemanticTarget::ResumeUpload).await {
                    match input.upload(path).await {
                        Ok(()) => info!("{} 📎 已上传简历", ctx),
                        Err(e) => warn!("{} ⚠️ 上传简历失败: {:#}", ctx, e),
                    }
                    state.resume_uploaded = true;
                }
            }
        }

        if !state.cover_letter_uploaded {
            if let Some(path) = &self.settings.cover_letter {
                if let Some(input) = self
                    .locator
                    .locate(session, SemanticTarget::CoverLetterUpload)
                    .await
                {
                    match input.upload(path).await {
                        Ok(()) => info!("{} 📎 已上传求职信", ctx),
                        Err(e) => warn!("{} ⚠️ 上传求职信失败: {:#}", ctx, e),
                    }
                    state.cover_letter_uploaded = true;
                }
            }
        }
    }

    /// 关闭申请弹窗并确认放弃，保证下一个职位从干净的页面开始
    async fn discard<S: BrowserSession>(&self, session: &S, ctx: &ApplyCtx) {
        if dismiss_overlays(session, &self.locator, self.settings.settle / 2).await == 0 {
            return;
        }
        if let Some(confirm) = self.locator.locate(session, SemanticTarget::DiscardConfirm).await {
            match confirm.click().await {
                Ok(()) => debug!("{} 已放弃未完成的申请", ctx),
                Err(e) => debug!("{} 确认放弃失败: {}", ctx, e),
            }
        }
    }
}
