//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 运行处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 组合 职位 × 地点 搜索计划
//! - 管理浏览器资源（BrowserHandle、JsExecutor）
//! - 输出全局统计信息
//!
//! ### `search_processor` - 单组搜索处理器
//! - 逐页遍历一组搜索的结果
//! - 复用 ApplyFlow 处理每个职位
//! - 检查中断信号和投递上限
//! - 输出每页统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SearchQuery>)
//!     ↓
//! search_processor (处理 Vec<JobCard>)
//!     ↓
//! workflow::ApplyFlow (处理单个职位)
//!     ↓
//! services (能力层：locator / form_filler / resolver / ledger)
//!     ↓
//! infrastructure (基础设施：BrowserSession / JsExecutor)
//! ```

pub mod batch_processor;
pub mod search_processor;

// 重新导出主要类型
pub use batch_processor::{build_plan, until_cancelled, App};
pub use search_processor::{process_search, run_plan, RunOutcome, SearchPlan};
