//! 表单填写服务 - 业务能力层
//!
//! 只负责"填当前这一步的字段"能力，不关心步骤之间怎么走。
//! 单个字段失败只会记为未回答，不会中断这一步。

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::infrastructure::{BrowserSession, ElementHandle, Selector};
use crate::services::locator::{ElementLocator, SemanticTarget};
use crate::services::question_resolver::{normalize_question, QuestionResolver, Resolution};
use crate::utils::logging::truncate_text;

const RADIO: &str = "input[type='radio']";
const LABEL: &str = "label";
const TEXT_INPUT: &str = "input[type='text'], textarea";
const SELECT: &str = "select";
const ANY_INPUT: &str = "input";
const CONTACT_PHONE_LABEL: &str = "Mobile phone number";

/// 一步表单的填写结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub answered: usize,
    /// 没能回答的问题（已规范化）
    pub unanswered: Vec<String>,
    pub all_answered: bool,
}

/// 表单填写服务
pub struct FormStepExecutor {
    resolver: Arc<QuestionResolver>,
    locator: ElementLocator,
}

impl FormStepExecutor {
    pub fn new(resolver: Arc<QuestionResolver>, locator: ElementLocator) -> Self {
        Self { resolver, locator }
    }

    /// 填写当前步骤的所有字段组
    ///
    /// # 参数
    /// - `groups`: 当前可见的字段组
    /// - `declined`: 本职位里已经放弃的问题，不再重复询问
    ///
    /// # 返回
    /// 本步骤的填写统计
    pub async fn fill_step<E: ElementHandle>(
        &self,
        groups: &[E],
        declined: &HashSet<String>,
    ) -> StepReport {
        let mut report = StepReport::default();

        for group in groups {
            let label = match group.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!("读取字段文本失败: {}", e);
                    continue;
                }
            };
            let question = normalize_question(&label);
            if question.is_empty() {
                continue;
            }
            if declined.contains(&question) {
                report.unanswered.push(question);
                continue;
            }

            let answer = match self.resolver.resolve(&question).await {
                Resolution::Answered { answer, source } => {
                    info!("✍️ {} -> {} ({})", truncate_text(&question, 40), answer, source);
                    answer
                }
                Resolution::Deferred => {
                    report.unanswered.push(question);
                    continue;
                }
            };

            if fill_group(group, &answer).await {
                report.answered += 1;
            } else {
                warn!("⚠️ 无法填写: {}", truncate_text(&question, 50));
                report.unanswered.push(question);
            }
        }

        report.all_answered = report.unanswered.is_empty();
        report
    }

    /// 打开申请弹窗后补填手机号（输入框为空时）
    ///
    /// # 返回
    /// 是否填写了手机号
    pub async fn prefill_contact<S: BrowserSession>(&self, session: &S, phone: &str) -> bool {
        for group in self.locator.locate_all(session, SemanticTarget::ContactField).await {
            if !group.text().await.unwrap_or_default().contains(CONTACT_PHONE_LABEL) {
                continue;
            }
            let inputs = group.find_all(&Selector::css(ANY_INPUT)).await.unwrap_or_default();
            let Some(input) = inputs.first() else {
                continue;
            };
            let current = input.attribute("value").await.ok().flatten().unwrap_or_default();
            if !current.trim().is_empty() {
                debug!("手机号已预填");
                return false;
            }
            if input.clear().await.is_ok() && input.send_keys(phone).await.is_ok() {
                info!("📞 已填写手机号");
                return true;
            }
        }
        false
    }
}

/// 按 单选 → 文本 → 下拉 的顺序尝试填写一个字段组
async fn fill_group<E: ElementHandle>(group: &E, answer: &str) -> bool {
    let wanted = answer.to_lowercase();

    let radios = group.find_all(&Selector::css(RADIO)).await.unwrap_or_default();
    if !radios.is_empty() {
        let labels = group.find_all(&Selector::css(LABEL)).await.unwrap_or_default();
        for radio in &radios {
            let value = radio.attribute("value").await.ok().flatten().unwrap_or_default();
            let label = radio_label(radio, &labels).await;
            if !value.to_lowercase().contains(&wanted) && !label.to_lowercase().contains(&wanted) {
                continue;
            }
            if radio.click().await.is_ok() || radio.script_click().await.is_ok() {
                return true;
            }
        }
    }

    let inputs = group.find_all(&Selector::css(TEXT_INPUT)).await.unwrap_or_default();
    if let Some(input) = inputs.first() {
        if input.clear().await.is_ok() && input.send_keys(answer).await.is_ok() {
            return true;
        }
    }

    let selects = group.find_all(&Selector::css(SELECT)).await.unwrap_or_default();
    if let Some(select) = selects.first() {
        if select.select_option(answer).await.unwrap_or(false) {
            return true;
        }
    }

    false
}

/// 单选项的标签文本：`<label for=id>`，没有时用 aria-label
async fn radio_label<E: ElementHandle>(radio: &E, labels: &[E]) -> String {
    if let Some(id) = radio.attribute("id").await.ok().flatten() {
        for label in labels {
            if label.attribute("for").await.ok().flatten().as_deref() == Some(id.as_str()) {
                return label.text().await.unwrap_or_default();
            }
        }
    }
    radio
        .attribute("aria-label")
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
