//! 运行记录服务 - 业务能力层
//!
//! 只负责"记结果"能力：每个处理过的职位追加一行 CSV，同时累计统计。

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::{ApplicationAttempt, JobCard, RunStats};
use crate::services::qa_store::ensure_csv_with_header;

const HEADER: [&str; 6] = ["Timestamp", "Job ID", "Job Title", "Company", "Attempted", "Success"];

/// 运行记录
///
/// 职责：
/// - 结果文件只追加，不改写
/// - 统计计数只增不减
pub struct RunLedger {
    path: PathBuf,
    stats: RunStats,
    recorded: usize,
}

impl RunLedger {
    /// 打开结果文件，不存在时创建并写表头
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_csv_with_header(&path, &HEADER)?;
        Ok(Self {
            path,
            stats: RunStats::default(),
            recorded: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 本次运行写入的行数
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// 记录一个职位的最终结果
    ///
    /// 先计入统计再写文件；写文件失败时返回错误，统计不回退。
    pub fn record(&mut self, attempt: &ApplicationAttempt) -> Result<()> {
        self.stats.count_result(attempt.result);

        debug!(
            "写入结果: 职位 {} | {} | {}",
            attempt.job_id, attempt.job_title, attempt.result
        );

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("无法打开结果文件: {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record([
            attempt.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            attempt.job_id.clone(),
            attempt.job_title.clone(),
            attempt.company.clone(),
            python_bool(attempt.attempted).to_string(),
            python_bool(attempt.success()).to_string(),
        ])?;
        writer
            .flush()
            .with_context(|| format!("写入结果文件失败: {}", self.path.display()))?;

        self.recorded += 1;
        Ok(())
    }

    /// 记一张看到的卡片（卡片上已申请的不会进入状态机，也不写行）
    pub fn note_card(&mut self, card: &JobCard) {
        self.stats.total_found += 1;
        if card.already_applied {
            self.stats.already_applied += 1;
        }
    }

    pub fn snapshot(&self) -> RunStats {
        self.stats.clone()
    }
}

// 结果文件一直用 True/False，保持和已有文件兼容
fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
