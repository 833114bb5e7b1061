//! 问答存储服务 - 业务能力层
//!
//! 只负责"读写问答文件"能力：启动时全部读入，之后逐条追加。

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

const HEADER: [&str; 2] = ["Question", "Answer"];

/// 持久化的问答存储
pub trait QaStore: Send + Sync {
    /// 读出全部 (问题, 回答)，按文件顺序
    fn load(&self) -> Result<Vec<(String, String)>>;

    /// 追加一条并立即落盘
    fn append(&self, question: &str, answer: &str) -> Result<()>;
}

/// `qa_<username>.csv` 文件存储
pub struct CsvQaStore {
    path: PathBuf,
}

impl CsvQaStore {
    /// 打开存储，文件不存在时创建并写入表头
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_csv_with_header(&path, &HEADER)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QaStore for CsvQaStore {
    fn load(&self) -> Result<Vec<(String, String)>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("无法读取问答文件: {}", self.path.display()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("问答文件格式错误: {}", self.path.display()))?;
            let question = record.get(0).unwrap_or("").trim();
            let answer = record.get(1).unwrap_or("").trim();
            if question.is_empty() || answer.is_empty() {
                continue;
            }
            rows.push((question.to_string(), answer.to_string()));
        }
        debug!("从 {} 读入 {} 条问答", self.path.display(), rows.len());
        Ok(rows)
    }

    fn append(&self, question: &str, answer: &str) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("无法打开问答文件: {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record([question, answer])?;
        writer
            .flush()
            .with_context(|| format!("写入问答文件失败: {}", self.path.display()))?;
        Ok(())
    }
}

/// 只在内存里的存储，用于测试和不需要落盘的场景
#[derive(Default)]
pub struct MemoryQaStore {
    rows: Mutex<Vec<(String, String)>>,
}

impl MemoryQaStore {
    pub fn with_rows(rows: Vec<(String, String)>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn rows(&self) -> Vec<(String, String)> {
        self.rows.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl QaStore for MemoryQaStore {
    fn load(&self) -> Result<Vec<(String, String)>> {
        Ok(self.rows())
    }

    fn append(&self, question: &str, answer: &str) -> Result<()> {
        self.rows
            .lock()
            .map_err(|_| anyhow::anyhow!("问答存储锁已损坏"))?
            .push((question.to_string(), answer.to_string()));
        Ok(())
    }
}

/// 文件不存在或为空时创建并写入表头
pub(crate) fn ensure_csv_with_header(path: &Path, header: &[&str]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }

    let is_empty = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    if is_empty {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("无法创建文件: {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(header)?;
        writer.flush()?;
    }
    Ok(())
}
