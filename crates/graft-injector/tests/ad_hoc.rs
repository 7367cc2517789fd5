//! Integration tests for on-demand execution and the host message loop.

use graft_core::{LifecyclePhase, RunAt};
use graft_injector::{FailureKind, HostMessage, SchedulerState};
use graft_test::{
    RecordingCapabilityProvider, TEST_TARGET, test_content_script, test_coordinator,
    test_extension_id, test_request,
};
use serde_json::json;
use tokio::sync::mpsc;

/// `return 1+1` answers 2, tagged with the correlation id, before any
/// lifecycle event.
#[tokio::test]
async fn test_ad_hoc_answers_with_correlation_id() {
    let mut coordinator = test_coordinator(
        "https://a.test/page",
        RecordingCapabilityProvider::new(),
    );
    let request = test_request("return 1+1");
    let mut receiver = coordinator.responses().subscribe_request(request.request_id);

    let response = coordinator.handle_ad_hoc(&request);
    assert_eq!(response.request_id, request.request_id);
    assert_eq!(response.target, TEST_TARGET);
    assert_eq!(
        response.value().and_then(serde_json::Value::as_f64),
        Some(2.0)
    );
    assert_eq!(coordinator.state(), SchedulerState::NotStarted);

    let published = receiver.recv().await.unwrap();
    assert_eq!(*published, response);
}

/// Failures are surfaced to the requester with their kind.
#[tokio::test]
async fn test_ad_hoc_failures_are_surfaced() {
    let mut coordinator = test_coordinator(
        "https://a.test/page",
        RecordingCapabilityProvider::new(),
    );

    let thrown = coordinator.handle_ad_hoc(&test_request("throw new Error('nope')"));
    let failure = thrown.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Runtime);
    assert_eq!(failure.source_id, "adhoc.js");
    assert!(failure.message.contains("nope"));

    let broken = coordinator.handle_ad_hoc(&test_request("return )"));
    assert_eq!(broken.failure().unwrap().kind, FailureKind::Compile);

    // Ad-hoc failures are not counted as content-script failures.
    assert_eq!(coordinator.report().failed, 0);
}

/// The provider is asked once per execution with the configured background
/// flag.
#[test]
fn test_capability_context_per_execution() {
    let provider = RecordingCapabilityProvider::new().with_extra(json!({"tabId": 7}));
    let mut coordinator = test_coordinator("https://a.test/page", provider.clone());

    let response = coordinator.handle_ad_hoc(&test_request(
        "return [chrome.runtime.id, chrome.extra.tabId];",
    ));
    assert_eq!(response.value(), Some(&json!(["test-extension", 7])));
    assert_eq!(provider.calls(), vec![(test_extension_id(), false)]);
}

/// Responses to interleaved requests are matched by correlation id.
#[tokio::test]
async fn test_filtered_receivers_match_their_request() {
    let mut coordinator = test_coordinator(
        "https://a.test/page",
        RecordingCapabilityProvider::new(),
    );
    let first = test_request("return 'first';");
    let second = test_request("return 'second';");
    let mut second_rx = coordinator.responses().subscribe_request(second.request_id);
    let mut first_rx = coordinator.responses().subscribe_request(first.request_id);

    coordinator.handle_ad_hoc(&second);
    coordinator.handle_ad_hoc(&first);

    assert_eq!(first_rx.recv().await.unwrap().value(), Some(&json!("first")));
    assert_eq!(second_rx.recv().await.unwrap().value(), Some(&json!("second")));
}

/// The run loop handles lifecycle events and requests until the host closes
/// the channel, and answers every request exactly once.
#[tokio::test]
async fn test_run_loop() {
    let provider = RecordingCapabilityProvider::new();
    let mut coordinator = test_coordinator("https://a.test/page", provider.clone());
    coordinator.inject_all(
        &test_extension_id(),
        &[
            test_content_script("<all_urls>", RunAt::DocumentStart, "globalThis.started = true;"),
            test_content_script("<all_urls>", RunAt::DocumentIdle, "1"),
        ],
    );
    let mut responses = coordinator.subscribe();

    let early = test_request("return globalThis.started === true;");
    let late = test_request("return document.readyState;");
    let (tx, rx) = mpsc::channel(16);
    tx.send(HostMessage::ExecuteScript(early.clone())).await.unwrap();
    for phase in LifecyclePhase::ALL {
        tx.send(HostMessage::Lifecycle { phase }).await.unwrap();
    }
    // Repeated events are ignored, not fatal.
    tx.send(HostMessage::Lifecycle {
        phase: LifecyclePhase::Start,
    })
    .await
    .unwrap();
    tx.send(HostMessage::ExecuteScript(late.clone())).await.unwrap();
    drop(tx);

    coordinator.run(rx).await;

    let first = responses.recv().await.unwrap();
    assert_eq!(first.request_id, early.request_id);
    assert_eq!(first.value(), Some(&json!(false)));

    let second = responses.recv().await.unwrap();
    assert_eq!(second.request_id, late.request_id);
    assert_eq!(second.value(), Some(&json!("complete")));
    assert!(responses.try_recv().is_none());

    assert_eq!(coordinator.state(), SchedulerState::IdleFired);
    assert_eq!(coordinator.report().executed, 2);
    assert_eq!(provider.call_count(), 4);
}
