//! 职位处理上下文
//!
//! 封装"我正在处理哪一页的第几个职位"这一信息

use std::fmt::Display;

/// 职位处理上下文
#[derive(Debug, Clone)]
pub struct ApplyCtx {
    /// 职位ID
    pub job_id: String,

    /// 搜索结果页序号（从1开始，仅用于日志）
    pub page_number: usize,

    /// 职位在本页中的序号（从1开始）
    pub card_index: usize,

    /// 本页职位数
    pub card_total: usize,
}

impl ApplyCtx {
    pub fn new(job_id: String, page_number: usize, card_index: usize, card_total: usize) -> Self {
        Self {
            job_id,
            page_number,
            card_index,
            card_total,
        }
    }
}

impl Display for ApplyCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[职位 #{} 第{}页 {}/{}]",
            self.job_id, self.page_number, self.card_index, self.card_total
        )
    }
}
