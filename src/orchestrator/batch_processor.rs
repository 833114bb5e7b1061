//! 运行处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源管理和全部搜索的调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：选择候选人配置、打开结果/问答文件、获取浏览器
//! 2. **登录**：尽力提交账号密码
//! 3. **搜索调度**：职位 × 地点 逐组交给 `search_processor`
//! 4. **资源管理**：持有 BrowserHandle 和 JsExecutor，退出时统一释放
//! 5. **全局统计**：结束时输出最终统计
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个职位的细节
//! - **资源所有者**：唯一持有浏览器的模块
//! - **顺序执行**：一个页面，一次一个职位

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::browser::BrowserHandle;
use crate::config::{Config, PromptMode};
use crate::error::{AppError, AppResult, FileError};
use crate::infrastructure::JsExecutor;
use crate::models::{select_profile, CandidateProfile, SearchQuery};
use crate::orchestrator::search_processor::{run_plan, RunOutcome, SearchPlan};
use crate::services::{
    login, AnswerPrompter, ConsolePrompter, CsvQaStore, ElementLocator, FormStepExecutor,
    LocatorTable, PaginatorSettings, ProfileAnswers, QaCache, QuestionResolver, RunLedger,
    SkipPrompter,
};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::{ApplyFlow, FlowSettings};

/// 应用主结构
pub struct App {
    config: Config,
    profile: CandidateProfile,
    browser: BrowserHandle,
    executor: JsExecutor,
    locator: ElementLocator,
    flow: ApplyFlow,
    ledger: RunLedger,
    plan: SearchPlan,
    log_file: Option<PathBuf>,
}

impl App {
    /// 初始化应用
    ///
    /// 配置、文件、浏览器任何一项失败都是致命错误，此时还没有处理任何职位。
    pub async fn initialize(config: Config, log_file: Option<PathBuf>) -> AppResult<Self> {
        let (_profile_path, profile) = select_profile(&config).await?;
        log_startup(&config, &profile);

        // 结果文件和问答文件
        let output_dir = PathBuf::from(&config.output_dir);
        let result_path = output_dir.join(profile.result_file_name());
        let ledger = RunLedger::open(&result_path).map_err(|e| write_failed(&result_path, e))?;
        info!("📝 结果文件: {}", ledger.path().display());

        let qa_path = output_dir.join(profile.qa_file_name());
        let qa_store = CsvQaStore::open(&qa_path).map_err(|e| write_failed(&qa_path, e))?;
        let cache = QaCache::load(Arc::new(qa_store)).map_err(|e| {
            AppError::File(FileError::ReadFailed {
                path: qa_path.display().to_string(),
                source: e.into(),
            })
        })?;
        info!("💡 已载入 {} 条历史问答", cache.len());

        let prompter: Arc<dyn AnswerPrompter> = match config.prompt_mode {
            PromptMode::Interactive => Arc::new(ConsolePrompter::new()),
            PromptMode::Skip => Arc::new(SkipPrompter),
        };
        let resolver = Arc::new(QuestionResolver::new(
            ProfileAnswers::from(&profile),
            cache,
            prompter,
            config.prompt_timeout(),
        ));

        let table = LocatorTable::load(config.selectors_file.as_deref()).await?;
        let locator = ElementLocator::new(Arc::new(table));

        // 上传文件相对于工作目录
        let base_dir = std::env::current_dir().map_err(|e| AppError::Other(format!("无法获取工作目录: {}", e)))?;
        let resume = profile.resume_path(&base_dir);
        match (&profile.uploads.resume, &resume) {
            (Some(raw), None) => warn!("⚠️ 简历文件不存在，将不会上传: {}", raw),
            (_, Some(path)) => info!("📎 简历: {}", path.display()),
            _ => {}
        }
        let cover_letter = profile.cover_letter_path(&base_dir);

        let flow = ApplyFlow::new(
            locator.clone(),
            FormStepExecutor::new(resolver, locator.clone()),
            FlowSettings {
                site_url: config.site_url.clone(),
                max_form_steps: config.max_form_steps,
                step_deadline: config.step_deadline(),
                settle: config.settle_delay(),
                scroll_step: config.settle_delay() / 10,
                black_list_titles: profile.black_list_titles.clone(),
                resume,
                cover_letter,
                phone_number: profile.phone_number.clone(),
            },
        );

        let plan = build_plan(&config, &profile);

        // 浏览器放在最后，前面的配置错误不需要浏览器也能报出来
        let (browser, page) = BrowserHandle::acquire(&config).await?;
        let executor = JsExecutor::new(page);

        Ok(Self {
            config,
            profile,
            browser,
            executor,
            locator,
            flow,
            ledger,
            plan,
            log_file,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self, cancel: &CancellationToken) -> RunOutcome {
        let signed_in = until_cancelled(
            cancel,
            login(
                &self.executor,
                &self.locator,
                &self.config.site_url,
                &self.profile.username,
                &self.profile.password,
                self.config.settle_delay(),
            ),
        )
        .await;

        let outcome = match signed_in {
            None => RunOutcome::Cancelled,
            Some(login_result) => {
                if let Err(e) = login_result {
                    warn!("⚠️ 登录失败，继续使用当前会话: {:#}", e);
                }
                self.search(cancel).await
            }
        };

        match outcome {
            RunOutcome::Completed => info!("✓ 所有搜索已完成"),
            RunOutcome::Cancelled => warn!("⛔ 运行已被中断"),
            RunOutcome::LimitReached => info!("🎯 已达到投递上限 {}", self.config.max_applications),
        }

        print_final_stats(
            &self.ledger.snapshot(),
            self.ledger.path(),
            self.log_file.as_deref(),
        );
        outcome
    }

    async fn search(&mut self, cancel: &CancellationToken) -> RunOutcome {
        if self.plan.queries.is_empty() {
            warn!("⚠️ 配置里没有职位或地点，没有可执行的搜索");
            RunOutcome::Completed
        } else {
            run_plan(
                &self.executor,
                &self.locator,
                &self.flow,
                &self.plan,
                &mut self.ledger,
                cancel,
            )
            .await
        }
    }

    /// 释放浏览器
    pub async fn shutdown(self) {
        self.browser.shutdown().await;
    }
}

/// 在取消信号到来之前运行 `fut`
///
/// # 返回
/// 被取消时返回 `None`，`fut` 会被直接丢弃
pub async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

/// 职位 × 地点 组合成搜索计划
pub fn build_plan(config: &Config, profile: &CandidateProfile) -> SearchPlan {
    let queries = profile
        .positions
        .iter()
        .flat_map(|position| {
            profile
                .locations
                .iter()
                .map(move |location| SearchQuery::new(position, location, profile))
        })
        .collect();

    SearchPlan {
        queries,
        blacklist: profile.blacklist.clone(),
        paginator: PaginatorSettings {
            site_url: config.site_url.clone(),
            max_pages: config.max_search_pages,
            card_wait: config.card_wait(),
            settle: config.settle_delay(),
            scroll_step: config.settle_delay() / 10,
        },
        max_applications: config.max_applications,
        pause_between_jobs: config.settle_delay(),
    }
}

fn write_failed(path: &std::path::Path, e: anyhow::Error) -> AppError {
    AppError::File(FileError::WriteFailed {
        path: path.display().to_string(),
        source: e.into(),
    })
}
