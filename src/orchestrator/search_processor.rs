//! 单组搜索处理器 - 编排层
//!
//! ## 职责
//!
//! 处理一组 职位 × 地点 的所有搜索结果页，是搜索级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **翻页**：按需从 `SearchPaginator` 取下一页
//! 2. **过滤**：卡片上已申请的职位直接计数跳过，不进入申请流程
//! 3. **流程调度**：复用同一个 `ApplyFlow` 处理每个职位
//! 4. **记录**：每个进入流程的职位写一行结果
//! 5. **中断与上限**：每页、每个职位开始前检查取消信号和投递上限

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::infrastructure::BrowserSession;
use crate::models::SearchQuery;
use crate::services::{ElementLocator, PaginatorSettings, RunLedger, SearchPaginator};
use crate::utils::logging::{log_page_start, log_search_start, print_stats};
use crate::workflow::{ApplyCtx, ApplyFlow};

/// 一次运行要执行的全部搜索
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub queries: Vec<SearchQuery>,
    /// 公司黑名单（卡片级）
    pub blacklist: Vec<String>,
    pub paginator: PaginatorSettings,
    /// 成功投递上限
    pub max_applications: usize,
    /// 两个职位之间的停顿
    pub pause_between_jobs: Duration,
}

/// 运行结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 所有搜索都处理完
    Completed,
    /// 操作员中断
    Cancelled,
    /// 达到投递上限
    LimitReached,
}

/// 依次执行计划中的所有搜索
pub async fn run_plan<S: BrowserSession>(
    session: &S,
    locator: &ElementLocator,
    flow: &ApplyFlow,
    plan: &SearchPlan,
    ledger: &mut RunLedger,
    cancel: &CancellationToken,
) -> RunOutcome {
    let total = plan.queries.len();
    for (index, query) in plan.queries.iter().enumerate() {
        log_search_start(index + 1, total, query);
        let outcome = process_search(session, locator, flow, query, plan, ledger, cancel).await;
        if outcome != RunOutcome::Completed {
            return outcome;
        }
        info!("✓ 搜索 {}/{} 完成", index + 1, total);
    }
    RunOutcome::Completed
}

/// 处理一组搜索的所有结果页
///
/// # 参数
/// - `session`: 浏览器页面
/// - `query`: 本组搜索条件
/// - `ledger`: 运行记录（写结果、累计统计）
/// - `cancel`: 取消信号
///
/// # 返回
/// 本组结束的原因
pub async fn process_search<S: BrowserSession>(
    session: &S,
    locator: &ElementLocator,
    flow: &ApplyFlow,
    query: &SearchQuery,
    plan: &SearchPlan,
    ledger: &mut RunLedger,
    cancel: &CancellationToken,
) -> RunOutcome {
    let mut paginator = SearchPaginator::new(
        session,
        locator,
        query.clone(),
        &plan.blacklist,
        plan.paginator.clone(),
    );

    loop {
        // ========== 每页开始前的检查 ==========
        if cancel.is_cancelled() {
            return RunOutcome::Cancelled;
        }
        if limit_reached(ledger, plan) {
            return RunOutcome::LimitReached;
        }

        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RunOutcome::Cancelled,
            page = paginator.next_page() => page,
        };
        let Some(page) = page else {
            break;
        };

        let page_number = page.page_index + 1;
        let card_total = page.cards.len();
        log_page_start(page_number, card_total);

        for (idx, card) in page.cards.iter().enumerate() {
            // ========== 每个职位开始前的检查 ==========
            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            if limit_reached(ledger, plan) {
                info!("🎯 已达到本次投递上限 ({})", plan.max_applications);
                return RunOutcome::LimitReached;
            }

            ledger.note_card(card);
            if card.already_applied {
                info!("[职位 #{}] ⏭️ 卡片显示已申请，跳过", card.job_id);
                continue;
            }

            let ctx = ApplyCtx::new(card.job_id.clone(), page_number, idx + 1, card_total);
            info!("\n{} 开始处理", ctx);

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("{} ⛔ 收到中断，放弃当前职位（不记录）", ctx);
                    return RunOutcome::Cancelled;
                }
                attempt = flow.process(session, &ctx) => attempt,
            };

            if let Err(e) = ledger.record(&attempt) {
                error!("{} ❌ 写入结果文件失败: {:#}", ctx, e);
            }
            if attempt.success() {
                info!(
                    "{} 🎉 第 {} 个成功投递",
                    ctx,
                    ledger.snapshot().successfully_applied
                );
            }

            sleep(plan.pause_between_jobs).await;
        }

        print_stats(&ledger.snapshot());
    }

    RunOutcome::Completed
}

fn limit_reached(ledger: &RunLedger, plan: &SearchPlan) -> bool {
    ledger.snapshot().successfully_applied >= plan.max_applications
}
