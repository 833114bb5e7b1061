//! 单个职位申请流程的场景测试（内存假页面）

mod common;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use easy_apply_submit::models::ApplyResult;
use easy_apply_submit::services::{
    AnswerPrompter, ElementLocator, FormStepExecutor, LocatorTable, MemoryQaStore, ProfileAnswers,
    QaCache, QuestionResolver, RunLedger, SemanticTarget, SkipPrompter,
};
use easy_apply_submit::workflow::{ApplyCtx, ApplyFlow, FlowSettings};

const JOB_URL: &str = "/jobs/view/101/";

/// 记录被问了几次的询问通道
struct CountingPrompter {
    calls: AtomicUsize,
    answer: Option<String>,
}

impl CountingPrompter {
    fn new(answer: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            answer: answer.map(str::to_string),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerPrompter for CountingPrompter {
    async fn ask(&self, _question: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

fn answers() -> ProfileAnswers {
    ProfileAnswers {
        years_experience: "3".to_string(),
        phone_number: "5550100".to_string(),
        ..Default::default()
    }
}

fn build_flow(
    qa_rows: Vec<(String, String)>,
    prompter: Arc<dyn AnswerPrompter>,
    settings: FlowSettings,
) -> ApplyFlow {
    let locator = ElementLocator::new(Arc::new(LocatorTable::default()));
    let cache = QaCache::load(Arc::new(MemoryQaStore::with_rows(qa_rows))).unwrap();
    let resolver = Arc::new(QuestionResolver::new(
        answers(),
        cache,
        prompter,
        Duration::from_secs(5),
    ));
    ApplyFlow::new(
        locator.clone(),
        FormStepExecutor::new(resolver, locator),
        settings,
    )
}

fn ctx() -> ApplyCtx {
    ApplyCtx::new("101".to_string(), 1, 1, 1)
}

#[tokio::test]
async fn test_blacklisted_title_is_never_clicked() {
    let apply = easy_apply_button(ClickAction::Advance);
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Staffing Recruiter – Acme").with(&sel(SemanticTarget::ApplyButton), apply.clone()),
    );
    let mut settings = flow_settings();
    settings.black_list_titles = vec!["Staffing".to_string()];
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), settings);

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Blacklisted);
    assert!(apply.interactions().is_empty(), "黑名单职位不应点击申请按钮");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Output_of_alice.csv");
    let mut ledger = RunLedger::open(&path).unwrap();
    ledger.record(&attempt).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<&str> = content.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].contains(",101,"));
    assert!(rows[1].ends_with(",True,False"));
}

#[tokio::test]
async fn test_already_applied_marker() {
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Backend Engineer | Acme | LinkedIn")
            .source("<span>You applied on Jan 3</span>"),
    );
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::AlreadyApplied);
    assert!(!attempt.attempted);
    assert_eq!(attempt.job_title, "Backend Engineer");
    assert_eq!(attempt.company, "Acme");
}

#[tokio::test]
async fn test_no_apply_button_is_no_easy_apply() {
    let save = FakeNode::new().text("Save").attr("class", "jobs-apply-button").build();
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Backend Engineer | Acme | LinkedIn")
            .with(&sel(SemanticTarget::ApplyButton), save.clone()),
    );
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::NoEasyApply);
    assert!(save.interactions().is_empty());
}

#[tokio::test]
async fn test_two_step_form_with_cached_answer_submits_without_prompt() {
    let apply = easy_apply_button(ClickAction::None);
    let resume_input = FakeNode::new().attr("type", "file").build();
    let colour_input = FakeNode::new().build();
    let colour_group = FakeNode::new()
        .text("What is your  favourite colour?")
        .child("input[type='text'], textarea", colour_input.clone())
        .build();
    let submit = button("Submit application", ClickAction::None);

    let page = FakePage::new("Backend Engineer | Acme | LinkedIn")
        .with(&sel(SemanticTarget::ApplyButton), apply.clone())
        .step()
        .step_with(&sel(SemanticTarget::ResumeUpload), resume_input.clone())
        .step_with(
            &sel(SemanticTarget::NextButton),
            button("Next", ClickAction::Advance),
        )
        .step()
        .step_with(&sel(SemanticTarget::FieldGroup), colour_group)
        .step_with(
            &sel(SemanticTarget::NextButton),
            button("Next", ClickAction::Advance),
        )
        .step()
        .step_with(&sel(SemanticTarget::SubmitButton), submit.clone());
    let session = FakeSession::new().page(JOB_URL, page);

    let prompter = CountingPrompter::new(Some("Red"));
    let mut settings = flow_settings();
    settings.resume = Some(PathBuf::from("resume.pdf"));
    let flow = build_flow(
        vec![("what is your favourite colour?".to_string(), "Blue".to_string())],
        prompter.clone(),
        settings,
    );

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Submitted);
    assert!(attempt.success());
    assert_eq!(apply.count("script_click"), 1);
    assert_eq!(resume_input.interactions(), vec!["upload:resume.pdf".to_string()]);
    assert!(colour_input.interactions().contains(&"keys:Blue".to_string()));
    assert_eq!(submit.count("click"), 1);
    assert_eq!(prompter.calls(), 0, "缓存命中时不应询问");
}

#[tokio::test]
async fn test_unrecognized_state_is_abandoned() {
    let apply = easy_apply_button(ClickAction::None);
    let dismiss = button("Dismiss", ClickAction::None);
    let confirm = button("Discard", ClickAction::None);
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Backend Engineer | Acme | LinkedIn")
            .with(&sel(SemanticTarget::ApplyButton), apply)
            .step()
            .step_with(&sel(SemanticTarget::DismissOverlay), dismiss.clone())
            .step_with(&sel(SemanticTarget::DiscardConfirm), confirm.clone()),
    );
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Abandoned);
    // 放弃后关闭弹窗并确认丢弃
    assert!(dismiss.count("click") >= 1);
    assert_eq!(confirm.count("click"), 1);
}

#[tokio::test]
async fn test_step_ceiling_bounds_the_loop() {
    let next = button("Next", ClickAction::None);
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Backend Engineer | Acme | LinkedIn")
            .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None))
            .with(&sel(SemanticTarget::NextButton), next.clone()),
    );
    let mut settings = flow_settings();
    settings.max_form_steps = 4;
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), settings);

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Abandoned);
    assert_eq!(next.count("click"), 4);
}

#[tokio::test]
async fn test_click_failure_on_apply_button() {
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Backend Engineer | Acme | LinkedIn")
            .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::Fail)),
    );
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::ClickFailed);
    assert!(attempt.attempted);
}

#[tokio::test]
async fn test_application_sent_marker_counts_as_submitted() {
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Backend Engineer | Acme | LinkedIn")
            .source("<h3>Your application was sent to Acme</h3>")
            .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None)),
    );
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Submitted);
}

#[tokio::test]
async fn test_follow_company_clicked_once() {
    let follow = FakeNode::new().text("Follow Acme").build();
    let page = FakePage::new("Backend Engineer | Acme | LinkedIn")
        .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None))
        .with(&sel(SemanticTarget::FollowCompany), follow.clone())
        .step()
        .step_with(
            &sel(SemanticTarget::ReviewButton),
            button("Review", ClickAction::Advance),
        )
        .step()
        .step_with(
            &sel(SemanticTarget::SubmitButton),
            button("Submit application", ClickAction::None),
        );
    let session = FakeSession::new().page(JOB_URL, page);
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Submitted);
    assert_eq!(follow.count("click"), 1);
}

#[tokio::test]
async fn test_declined_question_is_asked_once_per_job() {
    let group = FakeNode::new()
        .text("Describe your ideal team")
        .child("input[type='text'], textarea", FakeNode::new().build())
        .build();
    let page = FakePage::new("Backend Engineer | Acme | LinkedIn")
        .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None))
        .with(&sel(SemanticTarget::FieldGroup), group)
        .with(&sel(SemanticTarget::NextButton), button("Next", ClickAction::None));
    let session = FakeSession::new().page(JOB_URL, page);

    let prompter = CountingPrompter::new(None);
    let mut settings = flow_settings();
    settings.max_form_steps = 3;
    let flow = build_flow(Vec::new(), prompter.clone(), settings);

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Abandoned);
    assert_eq!(prompter.calls(), 1);
}

#[tokio::test]
async fn test_contact_phone_prefilled_when_empty() {
    let phone_input = FakeNode::new().build();
    let contact = FakeNode::new()
        .text("Mobile phone number*")
        .child("input", phone_input.clone())
        .build();
    let page = FakePage::new("Backend Engineer | Acme | LinkedIn")
        .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None))
        .step()
        .step_with(&sel(SemanticTarget::ContactField), contact)
        .step_with(
            &sel(SemanticTarget::SubmitButton),
            button("Submit application", ClickAction::None),
        );
    let session = FakeSession::new().page(JOB_URL, page);
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Submitted);
    assert!(phone_input.interactions().contains(&"keys:5550100".to_string()));
}

#[tokio::test]
async fn test_navigation_error_is_abandoned() {
    let session = FakeSession::new().fail_navigation(JOB_URL, 1);
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Abandoned);
    assert_eq!(attempt.job_id, "101");
}

#[tokio::test(start_paused = true)]
async fn test_step_deadline_bounds_the_loop() {
    let next = button("Next", ClickAction::None);
    let session = FakeSession::new().page(
        JOB_URL,
        FakePage::new("Backend Engineer | Acme | LinkedIn")
            .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None))
            .with(&sel(SemanticTarget::NextButton), next.clone()),
    );
    // 每步等 10 秒，25 秒的时限只够三步，远低于步数上限
    let mut settings = flow_settings();
    settings.settle = Duration::from_secs(10);
    settings.step_deadline = Duration::from_secs(25);
    settings.max_form_steps = 12;
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), settings);

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Abandoned);
    assert_eq!(next.count("click"), 3);
}

#[tokio::test]
async fn test_cover_letter_uploaded_once() {
    let cover_input = FakeNode::new().attr("type", "file").build();
    let page = FakePage::new("Backend Engineer | Acme | LinkedIn")
        .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None))
        .with(&sel(SemanticTarget::CoverLetterUpload), cover_input.clone())
        .step()
        .step_with(
            &sel(SemanticTarget::NextButton),
            button("Next", ClickAction::Advance),
        )
        .step()
        .step_with(
            &sel(SemanticTarget::SubmitButton),
            button("Submit application", ClickAction::None),
        );
    let session = FakeSession::new().page(JOB_URL, page);
    let mut settings = flow_settings();
    settings.cover_letter = Some(PathBuf::from("cover_letter.pdf"));
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), settings);

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Submitted);
    // 输入框两步都在，只上传一次
    assert_eq!(
        cover_input.interactions(),
        vec!["upload:cover_letter.pdf".to_string()]
    );
}

#[tokio::test]
async fn test_no_cover_letter_configured_skips_upload() {
    let cover_input = FakeNode::new().attr("type", "file").build();
    let page = FakePage::new("Backend Engineer | Acme | LinkedIn")
        .with(&sel(SemanticTarget::ApplyButton), easy_apply_button(ClickAction::None))
        .with(&sel(SemanticTarget::CoverLetterUpload), cover_input.clone())
        .with(
            &sel(SemanticTarget::SubmitButton),
            button("Submit application", ClickAction::None),
        );
    let session = FakeSession::new().page(JOB_URL, page);
    let flow = build_flow(Vec::new(), Arc::new(SkipPrompter), flow_settings());

    let attempt = flow.process(&session, &ctx()).await;

    assert_eq!(attempt.result, ApplyResult::Submitted);
    assert!(cover_input.interactions().is_empty());
}
