//! # Easy Apply Submit
//!
//! 驱动浏览器自动投递 Easy Apply 职位的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `BrowserSession` / `ElementHandle` - 核心流程依赖的浏览器能力
//! - `JsExecutor` - 唯一的 page owner，基于 chromiumoxide 实现上面两个 trait
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个元素、单个问题、单页
//! - `ElementLocator` - 按候选选择器定位控件
//! - `QuestionResolver` - 规则表 → 问答缓存 → 询问操作员
//! - `FormStepExecutor` - 填写一步表单
//! - `SearchPaginator` - 搜索结果翻页
//! - `RunLedger` - 写结果 CSV、累计统计
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整申请流程
//! - `ApplyCtx` - 上下文封装（job_id + 页码 + 序号）
//! - `ApplyFlow` - 有上限的申请状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 运行处理器，管理资源和全部搜索
//! - `orchestrator/search_processor` - 单组搜索处理器，遍历结果页
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, BrowserHandle};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserSession, ElementHandle, JsExecutor, Selector};
pub use models::{ApplicationAttempt, ApplyResult, CandidateProfile, JobCard, RunStats};
pub use orchestrator::{App, RunOutcome};
pub use workflow::{ApplyCtx, ApplyFlow};
