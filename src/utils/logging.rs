/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::{date_filter_name, CandidateProfile, RunStats, SearchQuery};

/// 初始化日志：终端 + 本次运行的日志文件
///
/// `RUST_LOG` 优先，否则默认 `info`（详细模式下为 `debug`）。
///
/// # 返回
/// 日志文件路径，以及需要一直持有到退出的 guard
pub fn init_logging(log_dir: &str, verbose: bool) -> Result<(PathBuf, WorkerGuard)> {
    let dir = Path::new(log_dir);
    std::fs::create_dir_all(dir).with_context(|| format!("无法创建日志目录: {}", log_dir))?;

    let file_name = format!(
        "easy_apply_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let appender = tracing_appender::rolling::never(dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {}", e))?;

    Ok((dir.join(file_name), guard))
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, profile: &CandidateProfile) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - Easy Apply 自动投递");
    info!("👤 账号: {}", profile.username);
    info!(
        "🔎 职位 {} 个 × 地点 {} 个",
        profile.positions.len(),
        profile.locations.len()
    );
    info!("🗓️ 发布时间: {}", date_filter_name(&profile.date_posted));
    info!(
        "📊 每组最多 {} 页，本次最多投递 {} 个",
        config.max_search_pages, config.max_applications
    );
    info!("{}", "=".repeat(60));
}

/// 记录一组搜索开始
///
/// # 参数
/// - `index`: 第几组（从1开始）
/// - `total`: 总组数
/// - `query`: 搜索条件
pub fn log_search_start(index: usize, total: usize, query: &SearchQuery) {
    info!("\n{}", "=".repeat(60));
    info!("🔍 搜索 {}/{}: {} @ {}", index, total, query.position, query.location);
    info!("{}", "=".repeat(60));
}

/// 记录一页开始处理
pub fn log_page_start(page_number: usize, card_count: usize) {
    info!("\n{}", "─".repeat(50));
    info!("📄 第 {} 页，找到 {} 个职位", page_number, card_count);
    info!("{}", "─".repeat(50));
}

/// 打印当前统计
pub fn print_stats(stats: &RunStats) {
    info!("\n{}", "─".repeat(50));
    info!("📊 当前统计（已运行 {:.1} 分钟）", stats.elapsed_minutes());
    info!("发现职位: {}", stats.total_found);
    info!("已申请过: {}", stats.already_applied);
    info!("✅ 投递成功: {}", stats.successfully_applied);
    info!("❌ 失败: {}", stats.failed);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("{}", "─".repeat(50));
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 本次运行统计
/// - `result_file`: 结果 CSV 路径
/// - `log_file`: 日志文件路径
pub fn print_final_stats(stats: &RunStats, result_file: &Path, log_file: Option<&Path>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("总耗时: {:.1} 分钟", stats.elapsed_minutes());
    info!("{}", "=".repeat(60));
    info!("发现职位: {}", stats.total_found);
    info!("已申请过: {}", stats.already_applied);
    info!("✅ 投递成功: {}", stats.successfully_applied);
    info!("❌ 失败: {}", stats.failed);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", result_file.display());
    if let Some(log_file) = log_file {
        info!("日志已保存至: {}", log_file.display());
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
