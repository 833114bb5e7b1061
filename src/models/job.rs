use std::fmt;

use chrono::{DateTime, Local};

/// 搜索结果页上的一张职位卡片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    /// 站点分配的职位 ID（不透明字符串）
    pub job_id: String,
    /// 卡片是否显示已申请
    pub already_applied: bool,
    pub raw_text: String,
}

/// 单个职位的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyResult {
    /// 提交成功
    Submitted,
    /// 之前已经申请过
    AlreadyApplied,
    /// 没有 Easy Apply 入口（外部申请等）
    NoEasyApply,
    /// 标题命中黑名单
    Blacklisted,
    /// 点击 Easy Apply 按钮失败
    ClickFailed,
    /// 表单无法继续
    Abandoned,
}

impl ApplyResult {
    pub fn is_success(self) -> bool {
        matches!(self, ApplyResult::Submitted)
    }

    /// 是否找到了申请按钮（CSV 中的 Attempted 列）
    pub fn attempted(self) -> bool {
        !matches!(self, ApplyResult::AlreadyApplied | ApplyResult::NoEasyApply)
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplyResult::Submitted => "已提交",
            ApplyResult::AlreadyApplied => "已申请过",
            ApplyResult::NoEasyApply => "无 Easy Apply",
            ApplyResult::Blacklisted => "黑名单",
            ApplyResult::ClickFailed => "点击失败",
            ApplyResult::Abandoned => "已放弃",
        };
        write!(f, "{}", name)
    }
}

/// 一次申请记录，写入后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationAttempt {
    pub job_id: String,
    pub timestamp: DateTime<Local>,
    pub job_title: String,
    pub company: String,
    pub attempted: bool,
    pub result: ApplyResult,
}

impl ApplicationAttempt {
    /// 由页面标题构造记录
    ///
    /// 标题形如 `职位 | 公司 | 站点`，缺失部分记为 `Unknown`
    pub fn from_page_title(job_id: impl Into<String>, page_title: &str, result: ApplyResult) -> Self {
        let (job_title, company) = split_page_title(page_title);
        Self {
            job_id: job_id.into(),
            timestamp: Local::now(),
            job_title,
            company,
            attempted: result.attempted(),
            result,
        }
    }

    pub fn success(&self) -> bool {
        self.result.is_success()
    }
}

/// 拆分页面标题为 (职位, 公司)
pub fn split_page_title(page_title: &str) -> (String, String) {
    let mut parts = page_title.split(" | ").map(str::trim);
    let pick = |part: Option<&str>| match part {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => "Unknown".to_string(),
    };
    let job_title = pick(parts.next());
    let company = pick(parts.next());
    (job_title, company)
}

/// 本次运行的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub total_found: usize,
    pub already_applied: usize,
    pub successfully_applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub start_time: DateTime<Local>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            total_found: 0,
            already_applied: 0,
            successfully_applied: 0,
            failed: 0,
            skipped: 0,
            start_time: Local::now(),
        }
    }
}

impl RunStats {
    pub fn elapsed_minutes(&self) -> f64 {
        (Local::now() - self.start_time).num_seconds() as f64 / 60.0
    }

    /// 把一条申请记录计入对应的计数
    pub fn count_result(&mut self, result: ApplyResult) {
        match result {
            ApplyResult::Submitted => self.successfully_applied += 1,
            ApplyResult::AlreadyApplied => self.already_applied += 1,
            ApplyResult::NoEasyApply | ApplyResult::Blacklisted => self.skipped += 1,
            ApplyResult::ClickFailed | ApplyResult::Abandoned => self.failed += 1,
        }
    }
}
