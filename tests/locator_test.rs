//! 元素定位测试

mod common;

use std::sync::Arc;

use common::*;
use easy_apply_submit::infrastructure::ElementHandle;
use easy_apply_submit::services::{ElementLocator, LocatorTable, SemanticTarget};

const JOB_URL: &str = "/jobs/view/7/";

fn locator() -> ElementLocator {
    ElementLocator::new(Arc::new(LocatorTable::default()))
}

async fn open(page: FakePage) -> FakeSession {
    use easy_apply_submit::infrastructure::BrowserSession;
    let session = FakeSession::new().page(JOB_URL, page);
    tokio_test::assert_ok!(session.navigate("https://jobs.test/jobs/view/7/").await);
    session
}

#[tokio::test]
async fn test_hidden_and_disabled_elements_are_skipped() {
    let hidden = FakeNode::new().text("Next").hidden().build();
    let disabled = FakeNode::new().text("Next").disabled().build();
    let session = open(
        FakePage::new("Job")
            .with(&sel(SemanticTarget::NextButton), hidden)
            .with(&sel(SemanticTarget::NextButton), disabled),
    )
    .await;

    assert!(locator().locate(&session, SemanticTarget::NextButton).await.is_none());
    // 存在性检查不看可见性
    assert!(locator().is_present(&session, SemanticTarget::NextButton).await);
}

#[tokio::test]
async fn test_later_candidate_used_when_earlier_fails() {
    let primary = FakeNode::new().text("Easy Apply").build();
    let session = open(
        FakePage::new("Job").with(&sel_at(SemanticTarget::ApplyButton, 5), primary),
    )
    .await;

    let found = locator().locate(&session, SemanticTarget::ApplyButton).await;
    assert!(found.is_some());
}

#[tokio::test]
async fn test_apply_filter_rejects_negative_buttons() {
    let applied = FakeNode::new()
        .text("Applied")
        .attr("class", "jobs-apply-button")
        .build();
    let share = FakeNode::new().text("Share").build();
    let session = open(
        FakePage::new("Job")
            .with(&sel(SemanticTarget::ApplyButton), applied)
            .with(&sel_at(SemanticTarget::ApplyButton, 5), share),
    )
    .await;

    assert!(locator().locate(&session, SemanticTarget::ApplyButton).await.is_none());
}

#[tokio::test]
async fn test_fallback_scan_finds_apply_button() {
    let other = FakeNode::new().text("Message").build();
    let apply = FakeNode::new().text("Easy Apply").build();
    let session = open(
        FakePage::new("Job")
            .with("button", other)
            .with("button", apply.clone()),
    )
    .await;

    let found = locator()
        .locate(&session, SemanticTarget::ApplyButton)
        .await
        .unwrap();
    assert_eq!(found.text().await.unwrap(), "Easy Apply");
}

#[tokio::test]
async fn test_locate_all_uses_first_productive_candidate() {
    let a = FakeNode::new().text("Question A").build();
    let b = FakeNode::new().text("Question B").build();
    let c = FakeNode::new().text("Contact").build();
    let session = open(
        FakePage::new("Job")
            .with(&sel_at(SemanticTarget::FieldGroup, 0), a)
            .with(&sel_at(SemanticTarget::FieldGroup, 0), b)
            .with(&sel_at(SemanticTarget::FieldGroup, 1), c),
    )
    .await;

    let groups = locator().locate_all(&session, SemanticTarget::FieldGroup).await;
    assert_eq!(groups.len(), 2);
}
