mod support;

use std::sync::Arc;

use chrono::Utc;
use cleanflow_contracts::GatewayError;
use cleanflow_core::alerts::titles;
use cleanflow_core::{RunWriter, WriteIntent};
use cleanflow_model::{CleaningRun, RunStatus};
use support::{RecordingAlerts, TestRemoteStore, cleaner, protocol};

fn run(area: &str) -> CleaningRun {
    CleaningRun::begin(
        &protocol("terminal", 2, 1),
        area.into(),
        format!("Area {area}"),
        &cleaner(),
        None,
        Utc::now(),
    )
}

fn writer(store: &TestRemoteStore, alerts: &RecordingAlerts) -> RunWriter {
    RunWriter::spawn(Arc::new(store.clone()), Arc::new(alerts.clone()))
}

#[tokio::test]
async fn writes_land_in_submission_order() {
    let store = TestRemoteStore::new();
    let alerts = RecordingAlerts::default();
    let writer = writer(&store, &alerts);

    let mut current = run("A1");
    writer.submit(current.clone(), WriteIntent::Start);
    current.steps[0].complete(Utc::now(), Some("Dana Reyes".into()));
    writer.submit(current.clone(), WriteIntent::StepUpdate);
    current.status = RunStatus::Completed;
    writer.submit(current.clone(), WriteIntent::Completion);
    writer.flush().await;

    let statuses: Vec<_> = store
        .saved_runs()
        .iter()
        .map(|r| (r.status, r.completed_step_count()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (RunStatus::InProgress, 0),
            (RunStatus::InProgress, 1),
            (RunStatus::Completed, 1),
        ]
    );
}

#[tokio::test]
async fn flush_waits_for_held_writes() {
    let store = TestRemoteStore::new();
    let writer = writer(&store, &RecordingAlerts::default());

    let gate = store.hold_saves().await;
    writer.submit(run("A1"), WriteIntent::Start);
    let flushing = {
        let writer = writer.clone();
        tokio::spawn(async move { writer.flush().await })
    };
    tokio::task::yield_now().await;
    assert!(!flushing.is_finished());
    assert!(store.saved_runs().is_empty());

    drop(gate);
    flushing.await.expect("flush task");
    assert_eq!(store.saved_runs().len(), 1);
}

#[tokio::test]
async fn save_and_wait_reports_the_store_outcome() {
    let store = TestRemoteStore::new();
    let alerts = RecordingAlerts::default();
    let writer = writer(&store, &alerts);

    assert_eq!(
        writer.save_and_wait(run("A1"), WriteIntent::Completion).await,
        Ok(())
    );

    store.fail_saves(true);
    let err = writer
        .save_and_wait(run("B2"), WriteIntent::Completion)
        .await
        .expect_err("store rejects");
    assert!(matches!(err, GatewayError::Rejected(_)));
    assert_eq!(store.saved_runs().len(), 1);
}

#[tokio::test]
async fn failed_writes_raise_intent_specific_alerts() {
    let store = TestRemoteStore::new();
    let alerts = RecordingAlerts::default();
    let writer = writer(&store, &alerts);
    store.fail_saves(true);

    writer.submit(run("A1"), WriteIntent::Start);
    writer.submit(run("B2"), WriteIntent::Completion);
    writer.submit(run("C3"), WriteIntent::Cancellation);
    writer.flush().await;

    let raised = alerts.alerts();
    assert_eq!(raised.len(), 3);
    assert_eq!(raised[0].title, titles::SAVE_FAILED);
    assert!(raised[0].message.contains("Area A1"));
    assert_eq!(raised[1].title, titles::RUN_COMPLETION_FAILED);
    assert!(raised[1].message.contains("Area B2"));
    assert!(raised[1].message.contains("simulated rejection"));
    assert_eq!(raised[2].title, titles::SAVE_FAILED);
}

#[tokio::test]
async fn a_failed_write_does_not_block_later_ones() {
    let store = TestRemoteStore::new();
    let alerts = RecordingAlerts::default();
    let writer = writer(&store, &alerts);

    store.fail_saves(true);
    writer.save_and_wait(run("A1"), WriteIntent::Start).await.ok();
    store.fail_saves(false);
    writer.submit(run("A1"), WriteIntent::StepUpdate);
    writer.flush().await;

    assert_eq!(store.saved_runs().len(), 1);
    assert_eq!(alerts.alerts().len(), 1);
}
