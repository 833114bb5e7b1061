//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，把 chromiumoxide 的能力包装成 `BrowserSession`

use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::{Element, Page};
use serde_json::Value as JsonValue;

use crate::infrastructure::session::{BrowserSession, ElementHandle, Selector};

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露导航、查找、eval 能力
/// - 不认识 职位 / 表单
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    fn wrap(&self, elements: Vec<Element>) -> Vec<ChromiumElement> {
        elements
            .into_iter()
            .map(|element| ChromiumElement {
                element,
                page: self.page.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl BrowserSession for JsExecutor {
    type Element = ChromiumElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<ChromiumElement>> {
        let elements = match selector {
            Selector::Css(css) => self.page.find_elements(css.as_str()).await?,
            Selector::XPath(xpath) => self.page.find_xpaths(xpath.as_str()).await?,
        };
        Ok(self.wrap(elements))
    }

    async fn execute_script(&self, script: &str) -> Result<JsonValue> {
        self.eval(script).await
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn title(&self) -> Result<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }
}

const IS_DISPLAYED_JS: &str = r#"
function() {
    let el = this;
    if (el.tagName === 'INPUT' && el.type === 'file' && el.offsetParent === null) {
        el = el.closest('label, div') || el;
    }
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') {
        return false;
    }
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
}
"#;

const IS_ENABLED_JS: &str = r#"
function() {
    return !this.disabled && this.getAttribute('aria-disabled') !== 'true';
}
"#;

const CLEAR_JS: &str = r#"
function() {
    if ('value' in this) {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
    }
}
"#;

/// chromiumoxide 元素包装
///
/// 上传文件需要走 CDP 命令，所以同时持有 page
pub struct ChromiumElement {
    element: Element,
    page: Page,
}

impl ChromiumElement {
    async fn call_js(&self, function_declaration: impl Into<String>) -> Result<JsonValue> {
        let returns = self
            .element
            .call_js_fn(function_declaration.into(), false)
            .await?;
        Ok(returns.result.value.unwrap_or(JsonValue::Null))
    }

    async fn call_js_bool(&self, function_declaration: &str) -> Result<bool> {
        Ok(self
            .call_js(function_declaration)
            .await?
            .as_bool()
            .unwrap_or(false))
    }
}

#[async_trait]
impl ElementHandle for ChromiumElement {
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self>> {
        let elements = match selector {
            Selector::Css(css) => self.element.find_elements(css.as_str()).await?,
            Selector::XPath(xpath) => bail!("元素内部不支持 XPath 查找: {}", xpath),
        };
        Ok(elements
            .into_iter()
            .map(|element| ChromiumElement {
                element,
                page: self.page.clone(),
            })
            .collect())
    }

    async fn click(&self) -> Result<()> {
        self.element.click().await?;
        Ok(())
    }

    async fn script_click(&self) -> Result<()> {
        self.call_js("function() { this.click(); }").await?;
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.call_js("function() { this.scrollIntoView({ block: 'center' }); }")
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.call_js(CLEAR_JS).await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.element.focus().await?;
        self.element.type_str(text).await?;
        Ok(())
    }

    async fn upload(&self, path: &Path) -> Result<()> {
        let mut params = SetFileInputFilesParams::new(vec![path.to_string_lossy().into_owned()]);
        params.backend_node_id = Some(self.element.backend_node_id.clone());
        self.page
            .execute(params)
            .await
            .with_context(|| format!("上传文件失败: {}", path.display()))?;
        Ok(())
    }

    async fn select_option(&self, answer: &str) -> Result<bool> {
        let js_code = format!(
            r#"
            function() {{
                const wanted = {}.toLowerCase();
                for (const option of Array.from(this.options || [])) {{
                    if ((option.text || '').toLowerCase().includes(wanted)) {{
                        this.value = option.value;
                        this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                        return true;
                    }}
                }}
                return false;
            }}
            "#,
            serde_json::to_string(answer)?
        );
        Ok(self.call_js(js_code).await?.as_bool().unwrap_or(false))
    }

    async fn is_displayed(&self) -> Result<bool> {
        self.call_js_bool(IS_DISPLAYED_JS).await
    }

    async fn is_enabled(&self) -> Result<bool> {
        self.call_js_bool(IS_ENABLED_JS).await
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.element.attribute(name).await?)
    }

    async fn text(&self) -> Result<String> {
        Ok(self.element.inner_text().await?.unwrap_or_default())
    }
}
