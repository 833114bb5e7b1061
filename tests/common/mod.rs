//! 测试用的内存浏览器
//!
//! 页面由"选择器字符串 → 元素列表"组成，按选择器原文精确匹配。
//! 页面可以分步：点击带 `ClickAction::Advance` 的元素后进入下一步，
//! 下一步的元素叠加在基础元素之上。

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use easy_apply_submit::infrastructure::{BrowserSession, ElementHandle, Selector};
use easy_apply_submit::services::{
    AnswerPrompter, ElementLocator, FormStepExecutor, LocatorTable, MemoryQaStore, ProfileAnswers,
    QaCache, QuestionResolver, SemanticTarget, SkipPrompter,
};
use easy_apply_submit::workflow::{ApplyFlow, FlowSettings};
use serde_json::Value as JsonValue;

type NodeMap = HashMap<String, Vec<Arc<FakeNode>>>;

/// 内置定位表里某个目标的第 `index` 个候选选择器原文
pub fn sel_at(target: SemanticTarget, index: usize) -> String {
    LocatorTable::default().candidates(target)[index].as_str().to_string()
}

/// 内置定位表里某个目标的第一个候选选择器原文
pub fn sel(target: SemanticTarget) -> String {
    sel_at(target, 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    None,
    /// 进入页面的下一步
    Advance,
    /// 点击报错
    Fail,
}

/// 假元素
pub struct FakeNode {
    text: String,
    attrs: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    on_click: ClickAction,
    children: NodeMap,
    select_options: Vec<String>,
    interactions: Mutex<Vec<String>>,
}

impl FakeNode {
    pub fn new() -> FakeNodeBuilder {
        FakeNodeBuilder {
            node: FakeNode {
                text: String::new(),
                attrs: HashMap::new(),
                displayed: true,
                enabled: true,
                on_click: ClickAction::None,
                children: HashMap::new(),
                select_options: Vec::new(),
                interactions: Mutex::new(Vec::new()),
            },
        }
    }

    /// 对该元素做过的操作，如 `click`、`keys:Blue`、`upload:resume.pdf`
    pub fn interactions(&self) -> Vec<String> {
        self.interactions.lock().unwrap().clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.interactions().iter().filter(|a| a.as_str() == action).count()
    }

    fn record(&self, action: impl Into<String>) {
        self.interactions.lock().unwrap().push(action.into());
    }
}

pub struct FakeNodeBuilder {
    node: FakeNode,
}

impl FakeNodeBuilder {
    pub fn text(mut self, text: &str) -> Self {
        self.node.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.node.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.node.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.node.enabled = false;
        self
    }

    pub fn on_click(mut self, action: ClickAction) -> Self {
        self.node.on_click = action;
        self
    }

    pub fn child(mut self, selector: &str, child: Arc<FakeNode>) -> Self {
        self.node
            .children
            .entry(selector.to_string())
            .or_default()
            .push(child);
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.node.select_options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn build(self) -> Arc<FakeNode> {
        Arc::new(self.node)
    }
}

/// 一个假页面（用 URL 片段匹配）
#[derive(Default)]
pub struct FakePage {
    pub title: String,
    pub source: String,
    base: NodeMap,
    steps: Vec<NodeMap>,
}

impl FakePage {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// 所有步骤都存在的元素
    pub fn with(mut self, selector: &str, node: Arc<FakeNode>) -> Self {
        self.base.entry(selector.to_string()).or_default().push(node);
        self
    }

    /// 追加一步，返回的页面在该步上继续 `step_with`
    pub fn step(mut self) -> Self {
        self.steps.push(HashMap::new());
        self
    }

    /// 在最后一步上放元素
    pub fn step_with(mut self, selector: &str, node: Arc<FakeNode>) -> Self {
        if self.steps.is_empty() {
            self.steps.push(HashMap::new());
        }
        if let Some(last) = self.steps.last_mut() {
            last.entry(selector.to_string()).or_default().push(node);
        }
        self
    }
}

#[derive(Default)]
struct State {
    pages: Vec<(String, FakePage)>,
    current: Option<usize>,
    step: usize,
    navigations: Vec<String>,
    /// URL 片段 → 还要失败几次
    failures: Vec<(String, usize)>,
}

/// 内存浏览器会话
#[derive(Clone, Default)]
pub struct FakeSession {
    state: Arc<Mutex<State>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册页面：导航到包含 `url_fragment` 的 URL 时显示
    pub fn page(self, url_fragment: &str, page: FakePage) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .push((url_fragment.to_string(), page));
        self
    }

    /// 导航到包含 `url_fragment` 的 URL 时失败 `times` 次
    pub fn fail_navigation(self, url_fragment: &str, times: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((url_fragment.to_string(), times));
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn current_step(&self) -> usize {
        self.state.lock().unwrap().step
    }

    fn advance(&self) {
        self.state.lock().unwrap().step += 1;
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if let Some((_, remaining)) = state
            .failures
            .iter_mut()
            .find(|(fragment, remaining)| *remaining > 0 && url.contains(fragment.as_str()))
        {
            *remaining -= 1;
            bail!("net::ERR_CONNECTION_RESET at {}", url);
        }
        state.current = state
            .pages
            .iter()
            .position(|(fragment, _)| url.contains(fragment.as_str()));
        state.step = 0;
        Ok(())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<FakeElement>> {
        let state = self.state.lock().unwrap();
        let Some(index) = state.current else {
            return Ok(Vec::new());
        };
        let page = &state.pages[index].1;
        let key = selector.as_str();

        let mut nodes: Vec<Arc<FakeNode>> = page.base.get(key).cloned().unwrap_or_default();
        if let Some(step) = page.steps.get(state.step) {
            nodes.extend(step.get(key).cloned().unwrap_or_default());
        }
        Ok(nodes
            .into_iter()
            .map(|node| FakeElement {
                node,
                session: self.clone(),
            })
            .collect())
    }

    async fn execute_script(&self, _script: &str) -> Result<JsonValue> {
        Ok(JsonValue::Null)
    }

    async fn page_source(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .current
            .map(|i| state.pages[i].1.source.clone())
            .unwrap_or_default())
    }

    async fn title(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(state
            .current
            .map(|i| state.pages[i].1.title.clone())
            .unwrap_or_default())
    }
}

pub struct FakeElement {
    node: Arc<FakeNode>,
    session: FakeSession,
}

impl FakeElement {
    fn clicked(&self, kind: &str) -> Result<()> {
        self.node.record(kind);
        match self.node.on_click {
            ClickAction::None => Ok(()),
            ClickAction::Advance => {
                self.session.advance();
                Ok(())
            }
            ClickAction::Fail => bail!("element click intercepted"),
        }
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self>> {
        Ok(self
            .node
            .children
            .get(selector.as_str())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|node| FakeElement {
                node,
                session: self.session.clone(),
            })
            .collect())
    }

    async fn click(&self) -> Result<()> {
        self.clicked("click")
    }

    async fn script_click(&self) -> Result<()> {
        self.clicked("script_click")
    }

    async fn scroll_into_view(&self) -> Result<()> {
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.node.record("clear");
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.node.record(format!("keys:{}", text));
        Ok(())
    }

    async fn upload(&self, path: &Path) -> Result<()> {
        self.node.record(format!("upload:{}", path.display()));
        Ok(())
    }

    async fn select_option(&self, answer: &str) -> Result<bool> {
        let wanted = answer.to_lowercase();
        let found = self
            .node
            .select_options
            .iter()
            .find(|option| option.to_lowercase().contains(&wanted))
            .cloned();
        match found {
            Some(option) => {
                self.node.record(format!("select:{}", option));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_displayed(&self) -> Result<bool> {
        Ok(self.node.displayed)
    }

    async fn is_enabled(&self) -> Result<bool> {
        Ok(self.node.enabled)
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.node.attrs.get(name).cloned())
    }

    async fn text(&self) -> Result<String> {
        Ok(self.node.text.clone())
    }
}

/// 没有任何等待的流程参数
pub fn flow_settings() -> FlowSettings {
    FlowSettings {
        site_url: "https://jobs.test".to_string(),
        max_form_steps: 12,
        step_deadline: Duration::from_secs(60),
        settle: Duration::ZERO,
        scroll_step: Duration::ZERO,
        black_list_titles: Vec::new(),
        resume: None,
        cover_letter: None,
        phone_number: "5550100".to_string(),
    }
}

/// 一个会被定位器接受的 Easy Apply 按钮
pub fn easy_apply_button(on_click: ClickAction) -> Arc<FakeNode> {
    FakeNode::new()
        .text("Easy Apply")
        .attr("aria-label", "Easy Apply to Backend Engineer at Acme")
        .on_click(on_click)
        .build()
}

/// 普通按钮
pub fn button(label: &str, on_click: ClickAction) -> Arc<FakeNode> {
    FakeNode::new().text(label).on_click(on_click).build()
}

/// 使用内置定位表、空缓存、总是跳过询问的申请流程
pub fn skip_flow(settings: FlowSettings) -> ApplyFlow {
    prompting_flow(settings, Arc::new(SkipPrompter), Duration::from_secs(1))
}

/// 使用内置定位表、空缓存和指定询问通道的申请流程
pub fn prompting_flow(
    settings: FlowSettings,
    prompter: Arc<dyn AnswerPrompter>,
    prompt_timeout: Duration,
) -> ApplyFlow {
    let locator = ElementLocator::new(Arc::new(LocatorTable::default()));
    let cache = QaCache::load(Arc::new(MemoryQaStore::default())).unwrap();
    let resolver = QuestionResolver::new(ProfileAnswers::default(), cache, prompter, prompt_timeout);
    ApplyFlow::new(
        locator.clone(),
        FormStepExecutor::new(Arc::new(resolver), locator),
        settings,
    )
}
