use phf::phf_map;
use url::form_urlencoded::byte_serialize;

use crate::models::profile::CandidateProfile;

/// 每页职位数
pub const PAGE_SIZE: usize = 25;

/// 发布时间过滤代码 → 显示名称
static DATE_FILTER_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "r86400" => "Past 24 hours",
    "r604800" => "Past Week",
    "r2592000" => "Past Month",
    "" => "Any Time",
};

/// 获取发布时间过滤的可读名称
pub fn date_filter_name(code: &str) -> &'static str {
    DATE_FILTER_NAMES.get(code).copied().unwrap_or("Custom")
}

/// 一组 职位 × 地点 的搜索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub position: String,
    pub location: String,
    pub experience_level: Vec<u8>,
    pub roletype: Vec<u8>,
    pub date_posted: String,
}

impl SearchQuery {
    pub fn new(position: &str, location: &str, profile: &CandidateProfile) -> Self {
        Self {
            position: position.to_string(),
            location: location.to_string(),
            experience_level: profile.experience_level.clone(),
            roletype: profile.roletype.clone(),
            date_posted: profile.date_posted.clone(),
        }
    }

    /// 构造第 `start` 条开始的搜索 URL（只看 Easy Apply，按时间倒序）
    pub fn page_url(&self, site_url: &str, start: usize) -> String {
        let mut url = format!(
            "{}/jobs/search/?f_LF=f_AL&keywords={}",
            site_url.trim_end_matches('/'),
            encode(&self.position)
        );
        url.push_str(&roletype_param(&self.roletype));
        url.push_str(&format!("&location={}", encode(&self.location)));
        if !self.experience_level.is_empty() {
            let levels: Vec<String> = self.experience_level.iter().map(|l| l.to_string()).collect();
            url.push_str(&format!("&f_E={}", levels.join(",")));
        }
        if !self.date_posted.is_empty() {
            url.push_str(&format!("&f_TPR={}", self.date_posted));
        }
        url.push_str(&format!("&sortBy=DD&start={}", start));
        url
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// 工作方式过滤参数（1 现场 / 2 远程 / 3 混合）
///
/// 排序去重后用 `%2C` 连接，没有合法取值时为空
pub fn roletype_param(roletype: &[u8]) -> String {
    let mut types: Vec<u8> = roletype
        .iter()
        .copied()
        .filter(|t| (1..=3).contains(t))
        .collect();
    types.sort_unstable();
    types.dedup();
    if types.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = types.iter().map(|t| t.to_string()).collect();
    format!("&f_WT={}", joined.join("%2C"))
}
