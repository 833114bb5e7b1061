//! 问题解答服务 - 业务能力层
//!
//! 顺序：关键词规则表 → 问答缓存 → 询问操作员（有时限）。
//! 三者都给不出答案时返回 `Deferred`，由填表方把该字段记为未回答。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::models::CandidateProfile;
use crate::services::prompter::AnswerPrompter;
use crate::services::qa_store::QaStore;

const WISH_NOT_TO_ANSWER: &str = "Wish not to answer";

/// 规范化问题文本：小写、去首尾空白、连续空白合并为一个空格
pub fn normalize_question(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 答案来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSource {
    /// 命中规则表（规则名）
    Rule(&'static str),
    /// 问答缓存
    Cache,
    /// 操作员刚刚给出
    Operator,
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerSource::Rule(name) => write!(f, "规则:{}", name),
            AnswerSource::Cache => write!(f, "缓存"),
            AnswerSource::Operator => write!(f, "操作员"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Answered { answer: String, source: AnswerSource },
    Deferred,
}

impl Resolution {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Resolution::Answered { answer, .. } => Some(answer),
            Resolution::Deferred => None,
        }
    }
}

/// 规则表里取自候选人配置的答案
#[derive(Debug, Clone, Default)]
pub struct ProfileAnswers {
    pub salary: String,
    pub rate: String,
    pub phone_number: String,
    pub gender: String,
    pub sponsorship: String,
    pub clearance: String,
    pub years_experience: String,
}

impl From<&CandidateProfile> for ProfileAnswers {
    fn from(profile: &CandidateProfile) -> Self {
        Self {
            salary: profile.salary.clone(),
            rate: profile.rate.clone(),
            phone_number: profile.phone_number.clone(),
            gender: profile.gender.clone(),
            sponsorship: profile.answers.sponsorship.clone(),
            clearance: profile.answers.clearance.clone(),
            years_experience: profile.answers.years_experience.clone(),
        }
    }
}

#[derive(Clone, Copy)]
enum RuleAnswer {
    Fixed(&'static str),
    Salary,
    Rate,
    Phone,
    Gender,
    Sponsorship,
    Clearance,
    YearsExperience,
}

struct Rule {
    name: &'static str,
    keywords: &'static [&'static str],
    answer: RuleAnswer,
}

// 顺序即优先级
const RULES: &[Rule] = &[
    Rule {
        name: "citizenship",
        keywords: &["authorized", "authorization", "citizen", "legally", "eligible"],
        answer: RuleAnswer::Fixed("Yes"),
    },
    Rule {
        name: "sponsorship",
        keywords: &["sponsorship", "sponsor", "visa"],
        answer: RuleAnswer::Sponsorship,
    },
    Rule {
        name: "clearance",
        keywords: &["clearance"],
        answer: RuleAnswer::Clearance,
    },
    Rule {
        name: "relocation",
        keywords: &["relocate", "relocation"],
        answer: RuleAnswer::Fixed("Yes"),
    },
    Rule {
        name: "remote",
        keywords: &["remote", "work from home", "telecommute"],
        answer: RuleAnswer::Fixed("Yes"),
    },
    Rule {
        name: "comfort",
        keywords: &["are you comfortable"],
        answer: RuleAnswer::Fixed("Yes"),
    },
    Rule {
        name: "salary",
        keywords: &["salary", "compensation", "desired pay"],
        answer: RuleAnswer::Salary,
    },
    Rule {
        name: "hourly rate",
        keywords: &["hourly rate", "rate per hour"],
        answer: RuleAnswer::Rate,
    },
    Rule {
        name: "phone",
        keywords: &["phone number", "mobile phone"],
        answer: RuleAnswer::Phone,
    },
    Rule {
        name: "gender",
        keywords: &["gender"],
        answer: RuleAnswer::Gender,
    },
    Rule {
        name: "eeo",
        keywords: &["race", "ethnicity", "equal employment", "eeo", "lgbtq"],
        answer: RuleAnswer::Fixed(WISH_NOT_TO_ANSWER),
    },
    Rule {
        name: "years of experience",
        keywords: &["years of experience", "how many years"],
        answer: RuleAnswer::YearsExperience,
    },
    Rule {
        name: "notice period",
        keywords: &["notice period"],
        answer: RuleAnswer::Fixed("2 weeks"),
    },
    Rule {
        name: "degree",
        keywords: &["degree", "education"],
        answer: RuleAnswer::Fixed("Yes"),
    },
];

/// 在规则表中查找第一条命中的规则
///
/// # 参数
/// - `normalized`: 已规范化的问题
///
/// # 返回
/// (规则名, 答案)
pub fn match_rule(normalized: &str, answers: &ProfileAnswers) -> Option<(&'static str, String)> {
    let needs_sponsor = asks_for_sponsorship(normalized);
    let rule = RULES
        .iter()
        .filter(|rule| !(needs_sponsor && rule.name == "citizenship"))
        .find(|rule| rule.keywords.iter().any(|k| normalized.contains(k)))?;

    let or_default = |value: &str, default: &str| {
        if value.trim().is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }
    };

    let answer = match rule.answer {
        RuleAnswer::Fixed(text) => text.to_string(),
        RuleAnswer::Salary => answers.salary.clone(),
        RuleAnswer::Rate => answers.rate.clone(),
        RuleAnswer::Phone => answers.phone_number.clone(),
        RuleAnswer::Gender => or_default(&answers.gender, WISH_NOT_TO_ANSWER),
        RuleAnswer::Sponsorship => or_default(&answers.sponsorship, "No"),
        RuleAnswer::Clearance => or_default(&answers.clearance, "No"),
        RuleAnswer::YearsExperience => or_default(&answers.years_experience, "3"),
    };
    Some((rule.name, answer))
}

/// 问"是否需要担保"的问题，即使同时提到工作授权也按担保规则回答
fn asks_for_sponsorship(normalized: &str) -> bool {
    normalized.contains("require") && normalized.contains("sponsor")
}

/// 问题 → 答案缓存
///
/// 内存中的条目总是包含存储里的全部条目；已有答案不会被自动覆盖。
pub struct QaCache {
    entries: Mutex<HashMap<String, String>>,
    store: Arc<dyn QaStore>,
}

impl QaCache {
    /// 从存储读入全部问答（文件里重复的问题以最后一行为准）
    pub fn load(store: Arc<dyn QaStore>) -> Result<Self> {
        let mut entries = HashMap::new();
        for (question, answer) in store.load()? {
            entries.insert(normalize_question(&question), answer);
        }
        Ok(Self {
            entries: Mutex::new(entries),
            store,
        })
    }

    pub fn get(&self, normalized: &str) -> Option<String> {
        self.lock().get(normalized).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 记住一条新答案：先落盘，再写内存
    ///
    /// 已有答案的问题直接忽略，存储里不会出现第二行。
    /// 落盘失败只记录日志，本次运行内仍然可以复用。
    pub fn remember(&self, normalized: &str, answer: &str) {
        let mut entries = self.lock();
        if entries.contains_key(normalized) {
            debug!("问题已有答案，不覆盖: {}", normalized);
            return;
        }
        if let Err(e) = self.store.append(normalized, answer) {
            warn!("⚠️ 问答写入存储失败（仅本次运行有效）: {:#}", e);
        }
        entries.insert(normalized.to_string(), answer.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 问题解答服务
pub struct QuestionResolver {
    answers: ProfileAnswers,
    cache: QaCache,
    prompter: Arc<dyn AnswerPrompter>,
    prompt_timeout: Duration,
}

impl QuestionResolver {
    pub fn new(
        answers: ProfileAnswers,
        cache: QaCache,
        prompter: Arc<dyn AnswerPrompter>,
        prompt_timeout: Duration,
    ) -> Self {
        Self {
            answers,
            cache,
            prompter,
            prompt_timeout,
        }
    }

    pub fn cache(&self) -> &QaCache {
        &self.cache
    }

    /// 解答一个问题
    pub async fn resolve(&self, question: &str) -> Resolution {
        let normalized = normalize_question(question);
        if normalized.is_empty() {
            return Resolution::Deferred;
        }

        if let Some((rule, answer)) = match_rule(&normalized, &self.answers) {
            return Resolution::Answered {
                answer,
                source: AnswerSource::Rule(rule),
            };
        }

        if let Some(answer) = self.cache.get(&normalized) {
            return Resolution::Answered {
                answer,
                source: AnswerSource::Cache,
            };
        }

        match tokio::time::timeout(self.prompt_timeout, self.prompter.ask(&normalized)).await {
            Ok(Some(answer)) => {
                self.cache.remember(&normalized, &answer);
                info!("💾 已保存新答案，后续申请会直接使用");
                Resolution::Answered {
                    answer,
                    source: AnswerSource::Operator,
                }
            }
            Ok(None) => {
                debug!("操作员跳过了问题: {}", normalized);
                Resolution::Deferred
            }
            Err(_) => {
                warn!(
                    "⏱️ 等待回答超时 ({} 秒)，该字段留空",
                    self.prompt_timeout.as_secs()
                );
                Resolution::Deferred
            }
        }
    }
}
