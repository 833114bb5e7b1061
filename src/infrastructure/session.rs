//! 浏览器能力抽象 - 基础设施层
//!
//! 核心流程（定位、填表、状态机、翻页）只依赖这里的两个 trait，
//! 不依赖具体的浏览器驱动，测试时可以换成内存里的假页面。

use std::fmt;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// 元素选择器
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Selector::XPath(selector.into())
    }

    /// 以 `/` 或 `(` 开头的按 XPath 处理，其余按 CSS 处理
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('/') || raw.starts_with('(') {
            Selector::XPath(raw.to_string())
        } else {
            Selector::Css(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selector::Css(s) | Selector::XPath(s) => s,
        }
    }
}

impl From<String> for Selector {
    fn from(raw: String) -> Self {
        Selector::parse(&raw)
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Selector::parse(raw)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{}", s),
            Selector::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// 页面级能力
///
/// 对应一个浏览器标签页：导航、查找元素、执行脚本。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: ElementHandle;

    /// 导航到指定 URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// 查找所有匹配的元素，没有匹配时返回空列表
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self::Element>>;

    /// 在页面上执行 JS 表达式，返回值为 undefined 时得到 `Null`
    async fn execute_script(&self, script: &str) -> Result<JsonValue>;

    /// 当前页面的 HTML 源码
    async fn page_source(&self) -> Result<String>;

    /// 当前页面标题
    async fn title(&self) -> Result<String>;
}

/// 元素级能力
#[async_trait]
pub trait ElementHandle: Send + Sync + Sized {
    /// 在当前元素内部查找
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self>>;

    /// 原生点击（模拟鼠标）
    async fn click(&self) -> Result<()>;

    /// 脚本点击，元素被动画遮挡时使用
    async fn script_click(&self) -> Result<()>;

    /// 滚动到视口中央
    async fn scroll_into_view(&self) -> Result<()>;

    /// 清空输入框
    async fn clear(&self) -> Result<()>;

    /// 输入文本
    async fn send_keys(&self, text: &str) -> Result<()>;

    /// 给文件输入框设置上传文件
    async fn upload(&self, path: &Path) -> Result<()>;

    /// 选中文本包含 `answer` 的下拉选项，返回是否选中
    async fn select_option(&self, answer: &str) -> Result<bool>;

    async fn is_displayed(&self) -> Result<bool>;

    async fn is_enabled(&self) -> Result<bool>;

    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// 可见文本
    async fn text(&self) -> Result<String>;
}
