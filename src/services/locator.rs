//! 元素定位服务 - 业务能力层
//!
//! 每个语义目标对应一组按顺序尝试的候选选择器。找不到是正常结果（`None`），
//! 不是错误。选择器会随站点改版失效，所以候选表是数据，可以用 TOML 文件覆盖。

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{BrowserSession, ElementHandle, Selector};

/// 页面上需要定位的控件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticTarget {
    ApplyButton,
    ExternalApply,
    NextButton,
    ReviewButton,
    SubmitButton,
    ResumeUpload,
    CoverLetterUpload,
    FollowCompany,
    InlineError,
    FieldGroup,
    ContactField,
    DismissOverlay,
    DiscardConfirm,
    JobCard,
    CardAppliedBadge,
    ResultsList,
    ResultCount,
    LoginUsername,
    LoginPassword,
    LoginSubmit,
}

impl SemanticTarget {
    pub const ALL: [SemanticTarget; 20] = [
        SemanticTarget::ApplyButton,
        SemanticTarget::ExternalApply,
        SemanticTarget::NextButton,
        SemanticTarget::ReviewButton,
        SemanticTarget::SubmitButton,
        SemanticTarget::ResumeUpload,
        SemanticTarget::CoverLetterUpload,
        SemanticTarget::FollowCompany,
        SemanticTarget::InlineError,
        SemanticTarget::FieldGroup,
        SemanticTarget::ContactField,
        SemanticTarget::DismissOverlay,
        SemanticTarget::DiscardConfirm,
        SemanticTarget::JobCard,
        SemanticTarget::CardAppliedBadge,
        SemanticTarget::ResultsList,
        SemanticTarget::ResultCount,
        SemanticTarget::LoginUsername,
        SemanticTarget::LoginPassword,
        SemanticTarget::LoginSubmit,
    ];

    /// 覆盖文件里使用的名称
    pub fn name(self) -> String {
        format!("{:?}", self)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name.trim())
    }
}

impl fmt::Display for SemanticTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 含义模糊的控件（比如申请按钮）的关键词过滤
///
/// 肯定词在文本、`aria-label`、`data-control-name`、`class` 任一处出现即可；
/// 否定词只看文本和 `aria-label`。
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    pub affirm: Vec<String>,
    pub negate: Vec<String>,
}

impl KeywordFilter {
    fn new(affirm: &[&str], negate: &[&str]) -> Self {
        Self {
            affirm: affirm.iter().map(|s| s.to_string()).collect(),
            negate: negate.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 判断元素特征是否通过过滤（参数需已小写）
    pub fn accepts(&self, text: &str, aria: &str, data_control: &str, class: &str) -> bool {
        let affirmed = self.affirm.iter().any(|k| {
            text.contains(k.as_str())
                || aria.contains(k.as_str())
                || data_control.contains(k.as_str())
                || class.contains(k.as_str())
        });
        let negated = self
            .negate
            .iter()
            .any(|k| text.contains(k.as_str()) || aria.contains(k.as_str()));
        affirmed && !negated
    }
}

/// 单个目标的定位方式
#[derive(Debug, Clone, Default)]
pub struct TargetSpec {
    /// 按顺序尝试的候选选择器
    pub candidates: Vec<Selector>,
    pub filter: Option<KeywordFilter>,
    /// 候选全部失败后做全量扫描的选择器（只对有过滤器的目标有意义）
    pub fallback: Option<Selector>,
}

impl TargetSpec {
    fn of(candidates: &[&str]) -> Self {
        Self {
            candidates: candidates.iter().map(|s| Selector::parse(s)).collect(),
            filter: None,
            fallback: None,
        }
    }
}

/// 选择器覆盖文件的格式：`目标名 = ["选择器", ...]`
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
struct SelectorOverrides(HashMap<String, Vec<Selector>>);

/// 所有语义目标的定位表
#[derive(Debug, Clone)]
pub struct LocatorTable {
    specs: HashMap<SemanticTarget, TargetSpec>,
}

impl Default for LocatorTable {
    fn default() -> Self {
        use SemanticTarget::*;

        let mut specs = HashMap::new();
        specs.insert(
            ApplyButton,
            TargetSpec {
                filter: Some(KeywordFilter::new(
                    &["easy apply", "apply easily", "inapply"],
                    &["save", "share", "message", "follow", "applied", "application sent", "view application"],
                )),
                fallback: Some(Selector::css("button")),
                ..TargetSpec::of(&[
                    "button.jobs-apply-button--top-card",
                    "button[aria-label*='Easy Apply']",
                    "button[data-control-name='jobdetails_topcard_inapply']",
                    "//button[contains(text(), 'Easy Apply')]",
                    "//button[contains(@class, 'jobs-apply-button')]",
                    "button.artdeco-button--primary",
                ])
            },
        );
        specs.insert(
            ExternalApply,
            TargetSpec::of(&[
                "//a[contains(text(), 'Apply on company website')] | //button[contains(text(), 'Apply on company website')]",
            ]),
        );
        specs.insert(NextButton, TargetSpec::of(&["button[aria-label='Continue to next step']"]));
        specs.insert(ReviewButton, TargetSpec::of(&["button[aria-label='Review your application']"]));
        specs.insert(SubmitButton, TargetSpec::of(&["button[aria-label='Submit application']"]));
        specs.insert(
            ResumeUpload,
            TargetSpec::of(&[
                "//*[contains(@id, 'jobs-document-upload-file-input-upload-resume')]",
                "input[name='file']",
            ]),
        );
        specs.insert(
            CoverLetterUpload,
            TargetSpec::of(&["//*[contains(@id, 'jobs-document-upload-file-input-upload-cover-letter')]"]),
        );
        specs.insert(FollowCompany, TargetSpec::of(&["label[for='follow-company-checkbox']"]));
        specs.insert(InlineError, TargetSpec::of(&[".artdeco-inline-feedback__message"]));
        specs.insert(
            FieldGroup,
            TargetSpec::of(&[".jobs-easy-apply-form-section__grouping", ".fb-dash-form-element"]),
        );
        specs.insert(ContactField, TargetSpec::of(&[".fb-dash-form-element"]));
        specs.insert(
            DismissOverlay,
            TargetSpec::of(&[
                "button[aria-label='Dismiss']",
                "button.artdeco-modal__dismiss",
                "button.artdeco-toast-item__dismiss",
            ]),
        );
        specs.insert(
            DiscardConfirm,
            TargetSpec::of(&[
                "button[data-control-name='discard_application_confirm_btn']",
                "button[data-test-dialog-primary-btn]",
            ]),
        );
        specs.insert(JobCard, TargetSpec::of(&["div[data-job-id]", "li[data-job-id]", "[data-job-id]"]));
        specs.insert(CardAppliedBadge, TargetSpec::of(&[".job-card-container__footer-job-state"]));
        specs.insert(ResultsList, TargetSpec::of(&[".jobs-search-results-list"]));
        specs.insert(
            ResultCount,
            TargetSpec::of(&["small.jobs-search-results-list__text span[dir='ltr']", "span[dir='ltr']"]),
        );
        specs.insert(LoginUsername, TargetSpec::of(&["#username"]));
        specs.insert(LoginPassword, TargetSpec::of(&["#password"]));
        specs.insert(LoginSubmit, TargetSpec::of(&["button[type='submit']"]));

        Self { specs }
    }
}

impl LocatorTable {
    /// 内置表，如果给了覆盖文件则替换其中列出的目标的候选选择器
    pub async fn load(overrides_path: Option<&str>) -> AppResult<Self> {
        let mut table = Self::default();
        let Some(path) = overrides_path else {
            return Ok(table);
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file_read_failed(path, e))?;
        let count = table.apply_overrides(&content, path)?;
        info!("🔧 从 {} 加载了 {} 个目标的选择器", Path::new(path).display(), count);
        Ok(table)
    }

    /// 应用 TOML 覆盖，返回被覆盖的目标数
    pub fn apply_overrides(&mut self, content: &str, source: &str) -> AppResult<usize> {
        let overrides: SelectorOverrides =
            toml::from_str(content).map_err(|e| AppError::file_parse_failed(source, e))?;

        let mut count = 0;
        for (name, selectors) in overrides.0 {
            match SemanticTarget::from_name(&name) {
                Some(target) if !selectors.is_empty() => {
                    self.specs.entry(target).or_default().candidates = selectors;
                    count += 1;
                }
                Some(target) => warn!("⚠️ 目标 {} 的覆盖列表为空，保留内置选择器", target),
                None => warn!("⚠️ 未知的定位目标: {}", name),
            }
        }
        Ok(count)
    }

    pub fn spec(&self, target: SemanticTarget) -> Option<&TargetSpec> {
        self.specs.get(&target)
    }

    pub fn candidates(&self, target: SemanticTarget) -> &[Selector] {
        self.specs
            .get(&target)
            .map(|s| s.candidates.as_slice())
            .unwrap_or(&[])
    }
}

/// 元素定位服务
///
/// 职责：
/// - 按候选顺序查找可见、可用、通过关键词过滤的元素
/// - 只返回 Option / Vec / bool，不向上抛错
#[derive(Clone)]
pub struct ElementLocator {
    table: Arc<LocatorTable>,
}

impl ElementLocator {
    pub fn new(table: Arc<LocatorTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &LocatorTable {
        &self.table
    }

    /// 定位单个元素，成功时滚动到视口中央
    pub async fn locate<S: BrowserSession>(
        &self,
        session: &S,
        target: SemanticTarget,
    ) -> Option<S::Element> {
        let spec = self.table.spec(target)?;

        for (idx, selector) in spec.candidates.iter().enumerate() {
            for element in self.find(session, selector).await {
                if qualifies(&element, spec.filter.as_ref()).await {
                    debug!("定位 {} 成功（候选 #{}: {}）", target, idx + 1, selector);
                    scroll_to(&element).await;
                    return Some(element);
                }
            }
        }

        if let Some(fallback) = &spec.fallback {
            debug!("{} 的候选选择器全部失败，全量扫描 {}", target, fallback);
            for element in self.find(session, fallback).await {
                if qualifies(&element, spec.filter.as_ref()).await {
                    debug!("全量扫描找到 {}", target);
                    scroll_to(&element).await;
                    return Some(element);
                }
            }
        }

        None
    }

    /// 第一个有结果的候选选择器下所有合格的元素
    pub async fn locate_all<S: BrowserSession>(
        &self,
        session: &S,
        target: SemanticTarget,
    ) -> Vec<S::Element> {
        let Some(spec) = self.table.spec(target) else {
            return Vec::new();
        };

        for selector in &spec.candidates {
            let mut found = Vec::new();
            for element in self.find(session, selector).await {
                if qualifies(&element, spec.filter.as_ref()).await {
                    found.push(element);
                }
            }
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// 只检查是否存在，不看可见性（用于标记类目标）
    pub async fn is_present<S: BrowserSession>(&self, session: &S, target: SemanticTarget) -> bool {
        for selector in self.table.candidates(target) {
            if !self.find(session, selector).await.is_empty() {
                return true;
            }
        }
        false
    }

    /// 在某个元素内部检查目标是否存在
    pub async fn is_present_within<E: ElementHandle>(&self, scope: &E, target: SemanticTarget) -> bool {
        for selector in self.table.candidates(target) {
            match scope.find_all(selector).await {
                Ok(found) if !found.is_empty() => return true,
                Ok(_) => {}
                Err(e) => debug!("在元素内查找 {} 失败: {}", selector, e),
            }
        }
        false
    }

    async fn find<S: BrowserSession>(&self, session: &S, selector: &Selector) -> Vec<S::Element> {
        match session.find_all(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("查找 {} 失败: {}", selector, e);
                Vec::new()
            }
        }
    }
}

async fn qualifies<E: ElementHandle>(element: &E, filter: Option<&KeywordFilter>) -> bool {
    if !element.is_displayed().await.unwrap_or(false) {
        return false;
    }
    if !element.is_enabled().await.unwrap_or(false) {
        return false;
    }
    let Some(filter) = filter else {
        return true;
    };

    let text = element.text().await.unwrap_or_default().to_lowercase();
    let aria = lower_attr(element, "aria-label").await;
    let data_control = lower_attr(element, "data-control-name").await;
    let class = lower_attr(element, "class").await;
    filter.accepts(&text, &aria, &data_control, &class)
}

async fn lower_attr<E: ElementHandle>(element: &E, name: &str) -> String {
    element
        .attribute(name)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
        .to_lowercase()
}

async fn scroll_to<E: ElementHandle>(element: &E) {
    if let Err(e) = element.scroll_into_view().await {
        debug!("滚动到元素失败: {}", e);
    }
}
