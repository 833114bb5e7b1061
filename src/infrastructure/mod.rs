pub mod js_executor;
pub mod session;

pub use js_executor::{ChromiumElement, JsExecutor};
pub use session::{BrowserSession, ElementHandle, Selector};
