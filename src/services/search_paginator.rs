//! 搜索翻页服务 - 业务能力层
//!
//! 一次只加载一页，按需调用 `next_page`。

use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::infrastructure::{BrowserSession, ElementHandle};
use crate::models::{JobCard, SearchQuery, PAGE_SIZE};
use crate::services::locator::{ElementLocator, SemanticTarget};
use crate::services::page_actions::{dismiss_overlays, load_page, scroll_container};

const PAGE_LOAD_ATTEMPTS: usize = 2;
const CARD_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 判断卡片是否应视为已申请
///
/// 三个信号任一成立：文本含 "Applied" / "Application viewed"，有状态徽标，
/// 或文本里出现黑名单公司（不区分大小写）。依赖页面结构，改版时可能误判。
pub fn classify_card(text: &str, badge_present: bool, blacklist: &[String]) -> bool {
    if text.contains("Applied") || text.contains("Application viewed") || badge_present {
        return true;
    }
    let lower = text.to_lowercase();
    blacklist
        .iter()
        .map(|company| company.trim().to_lowercase())
        .any(|company| !company.is_empty() && lower.contains(&company))
}

/// 从 "1,234 results" 之类的文本里取出数字
pub fn parse_result_count(text: &str) -> Option<usize> {
    let re = Regex::new(r"\d").ok()?;
    let digits: String = re.find_iter(text).map(|m| m.as_str()).collect();
    digits.parse().ok()
}

/// 翻页参数
#[derive(Debug, Clone)]
pub struct PaginatorSettings {
    pub site_url: String,
    pub max_pages: usize,
    pub card_wait: Duration,
    pub settle: Duration,
    pub scroll_step: Duration,
}

/// 一页搜索结果（只含本轮第一次出现的卡片）
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// 从 0 开始的页序号
    pub page_index: usize,
    pub start: usize,
    pub cards: Vec<JobCard>,
}

/// 搜索翻页游标
pub struct SearchPaginator<'a, S: BrowserSession> {
    session: &'a S,
    locator: &'a ElementLocator,
    query: SearchQuery,
    blacklist: &'a [String],
    settings: PaginatorSettings,
    page_index: usize,
    start: usize,
    seen: HashSet<String>,
    total: Option<usize>,
    finished: bool,
}

impl<'a, S: BrowserSession> SearchPaginator<'a, S> {
    pub fn new(
        session: &'a S,
        locator: &'a ElementLocator,
        query: SearchQuery,
        blacklist: &'a [String],
        settings: PaginatorSettings,
    ) -> Self {
        Self {
            session,
            locator,
            query,
            blacklist,
            settings,
            page_index: 0,
            start: 0,
            seen: HashSet::new(),
            total: None,
            finished: false,
        }
    }

    /// 页面报告的结果总数（第一页加载后才有）
    pub fn reported_total(&self) -> Option<usize> {
        self.total
    }

    /// 加载下一页
    ///
    /// 返回 `None` 的情况：空页、没有新职位、达到页数上限、已达报告总数、
    /// 等待卡片超时。加载失败（重试后）的页直接跳过。
    pub async fn next_page(&mut self) -> Option<SearchPage> {
        loop {
            if self.finished || self.page_index >= self.settings.max_pages {
                return None;
            }

            let page_index = self.page_index;
            let start = self.start;
            self.page_index += 1;
            self.start += PAGE_SIZE;

            let url = self.query.page_url(&self.settings.site_url, start);
            if !self.load_with_retry(&url, page_index).await {
                continue;
            }

            dismiss_overlays(self.session, self.locator, self.settings.settle / 2).await;

            if !self.wait_for_cards().await {
                info!("📭 第 {} 页没有职位卡片，结果已到底", page_index + 1);
                self.finished = true;
                return None;
            }

            load_page(self.session, self.settings.scroll_step).await;
            if let Some(list) = self
                .locator
                .table()
                .candidates(SemanticTarget::ResultsList)
                .first()
            {
                scroll_container(self.session, list, self.settings.scroll_step).await;
            }

            if self.total.is_none() {
                self.total = self.read_total().await;
                if let Some(total) = self.total {
                    info!("📊 共有约 {} 个职位", total);
                }
            }

            let cards = self.scan_cards().await;
            if cards.is_empty() {
                info!("📭 第 {} 页没有可用的职位卡片", page_index + 1);
                self.finished = true;
                return None;
            }

            let fresh: Vec<JobCard> = cards
                .into_iter()
                .filter(|card| self.seen.insert(card.job_id.clone()))
                .collect();
            if fresh.is_empty() {
                info!("🔁 第 {} 页没有新职位，停止翻页", page_index + 1);
                self.finished = true;
                return None;
            }

            if let Some(total) = self.total {
                if self.start >= total {
                    self.finished = true;
                }
            }

            return Some(SearchPage {
                page_index,
                start,
                cards: fresh,
            });
        }
    }

    async fn load_with_retry(&self, url: &str, page_index: usize) -> bool {
        for attempt in 1..=PAGE_LOAD_ATTEMPTS {
            match self.session.navigate(url).await {
                Ok(()) => {
                    sleep(self.settings.settle).await;
                    return true;
                }
                Err(e) => warn!(
                    "⚠️ 第 {} 页加载失败 (第 {}/{} 次): {}",
                    page_index + 1,
                    attempt,
                    PAGE_LOAD_ATTEMPTS,
                    e
                ),
            }
        }
        warn!("⏭️ 跳过第 {} 页", page_index + 1);
        false
    }

    async fn wait_for_cards(&self) -> bool {
        let deadline = Instant::now() + self.settings.card_wait;
        loop {
            if self.locator.is_present(self.session, SemanticTarget::JobCard).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(CARD_POLL_INTERVAL).await;
        }
    }

    async fn read_total(&self) -> Option<usize> {
        let element = self
            .locator
            .locate(self.session, SemanticTarget::ResultCount)
            .await?;
        let text = element.text().await.ok()?;
        parse_result_count(&text)
    }

    async fn scan_cards(&self) -> Vec<JobCard> {
        let mut cards: Vec<JobCard> = Vec::new();
        for element in self.locator.locate_all(self.session, SemanticTarget::JobCard).await {
            let job_id = match element.attribute("data-job-id").await {
                Ok(Some(id)) if !id.trim().is_empty() && id.trim() != "search" => id.trim().to_string(),
                _ => continue,
            };
            if cards.iter().any(|c| c.job_id == job_id) {
                continue;
            }
            let raw_text = element.text().await.unwrap_or_default();
            let badge = self
                .locator
                .is_present_within(&element, SemanticTarget::CardAppliedBadge)
                .await;
            let already_applied = classify_card(&raw_text, badge, self.blacklist);
            debug!("卡片 {} 已申请={}", job_id, already_applied);
            cards.push(JobCard {
                job_id,
                already_applied,
                raw_text,
            });
        }
        cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_card_signals() {
        let blacklist = vec!["Acme Staffing".to_string()];
        assert!(classify_card("Backend Engineer\nApplied 3 days ago", false, &blacklist));
        assert!(classify_card("Backend Engineer\nApplication viewed", false, &blacklist));
        assert!(classify_card("Backend Engineer", true, &blacklist));
        assert!(classify_card("Recruiter\nACME STAFFING\nRemote", false, &blacklist));
        assert!(!classify_card("Backend Engineer\nGlobex\nEasy Apply", false, &blacklist));
        // 只认首字母大写的 "Applied"
        assert!(!classify_card("applied science lead", false, &blacklist));
    }

    #[test]
    fn test_classify_card_is_deterministic() {
        let blacklist = vec!["Globex".to_string(), "  ".to_string()];
        let text = "Data Engineer\nInitech\nPromoted";
        let first = classify_card(text, false, &blacklist);
        let second = classify_card(text, false, &blacklist);
        assert_eq!(first, second);
        assert!(!first);
    }

    #[test]
    fn test_parse_result_count() {
        assert_eq!(parse_result_count("1,234 results"), Some(1234));
        assert_eq!(parse_result_count("57"), Some(57));
        assert_eq!(parse_result_count("No results"), None);
    }
}
