pub mod auth;
pub mod form_filler;
pub mod locator;
pub mod page_actions;
pub mod prompter;
pub mod qa_store;
pub mod question_resolver;
pub mod run_ledger;
pub mod search_paginator;

pub use auth::{login, LoginOutcome};
pub use form_filler::{FormStepExecutor, StepReport};
pub use locator::{ElementLocator, KeywordFilter, LocatorTable, SemanticTarget, TargetSpec};
pub use prompter::{AnswerPrompter, ConsolePrompter, SkipPrompter};
pub use qa_store::{CsvQaStore, MemoryQaStore, QaStore};
pub use question_resolver::{
    match_rule, normalize_question, AnswerSource, ProfileAnswers, QaCache, QuestionResolver, Resolution,
};
pub use run_ledger::RunLedger;
pub use search_paginator::{classify_card, parse_result_count, PaginatorSettings, SearchPage, SearchPaginator};
