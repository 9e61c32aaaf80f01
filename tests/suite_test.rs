//! The full conformance suite, run offline against the in-memory service.

use std::sync::Arc;
use std::time::Duration;

use mturk_rs::client::Client;
use mturk_rs::fixture::{DEFAULT_TEMPLATE, hit_params};
use mturk_rs::suite::{
    Group, NOTIFICATION_SKIP_REASON, Outcome, Suite, THROTTLING_PAGES, legacy_probe,
    throttling_probe,
};
use mturk_rs::transport::fake::FakeMTurk;

fn offline_suite() -> (Arc<FakeMTurk>, Suite) {
    let fake = Arc::new(FakeMTurk::new());
    let suite = Suite::new(
        Client::with_transport(fake.clone()),
        Client::with_transport(fake.clone()),
    );
    (fake, suite)
}

#[tokio::test]
async fn every_group_passes_against_the_fake() {
    let (_, suite) = offline_suite();
    let report = suite.run().await;

    let failures: Vec<String> = report
        .scenarios()
        .iter()
        .filter(|s| matches!(s.outcome, Outcome::Failed(_)))
        .map(ToString::to_string)
        .collect();
    assert!(failures.is_empty(), "failed scenarios:\n{}", failures.join("\n"));
    assert!(report.is_success());
    assert_eq!(report.skipped(), 1);
}

#[tokio::test]
async fn report_lists_every_scenario_in_group_order() {
    let (_, suite) = offline_suite();
    let report = suite.run().await;

    let expected: Vec<(Group, &str)> = Group::ALL
        .iter()
        .flat_map(|g| g.scenarios().iter().map(move |name| (*g, *name)))
        .collect();
    let actual: Vec<(Group, &str)> = report
        .scenarios()
        .iter()
        .map(|s| (s.group, s.name.as_str()))
        .collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn send_test_event_notification_is_skipped_with_a_reason() {
    let (fake, suite) = offline_suite();
    let report = suite.with_groups(&[Group::Notification]).run().await;

    assert_eq!(
        report.outcome(Group::Notification, "SendTestEventNotification"),
        Some(&Outcome::Skipped(NOTIFICATION_SKIP_REASON.to_string()))
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn qualification_group_cleans_up_its_type() {
    let (fake, suite) = offline_suite();
    let report = suite.with_groups(&[Group::Qualification]).run().await;
    assert_eq!(report.passed(), Group::Qualification.scenarios().len());

    let calls = fake.calls();
    assert_eq!(calls.first().map(String::as_str), Some("CreateQualificationType"));
    assert_eq!(calls.last().map(String::as_str), Some("DisposeQualificationType"));
    assert_eq!(
        calls.iter().filter(|c| *c == "DisposeQualificationType").count(),
        1
    );
}

#[tokio::test]
async fn expired_hit_group_disposes_its_hit() {
    let (fake, suite) = offline_suite();
    let report = suite.with_groups(&[Group::ExpiredHit]).run().await;
    assert!(report.is_success());
    assert_eq!(
        fake.calls(),
        vec!["CreateHIT", "ForceExpireHIT", "SetHITAsReviewing", "DisposeHIT"]
    );
}

#[tokio::test]
async fn missing_template_fails_every_scenario_of_dependent_groups() {
    let (fake, suite) = offline_suite();
    let report = suite
        .with_template("/nonexistent/HTMLQuestion.xml")
        .with_groups(&[Group::Hits, Group::HitAndType])
        .run()
        .await;

    assert_eq!(
        report.failed(),
        Group::Hits.scenarios().len() + Group::HitAndType.scenarios().len()
    );
    for scenario in report.scenarios() {
        let reason = scenario.outcome.reason().unwrap_or_default();
        assert!(reason.starts_with("setup failed"), "{scenario}");
    }
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn production_runs_do_not_assert_the_sandbox_balance() {
    let (_, suite) = offline_suite();
    let report = suite
        .with_sandbox_balance(false)
        .with_groups(&[Group::Standalone])
        .run()
        .await;
    assert_eq!(
        report.outcome(Group::Standalone, "GetAccountBalance"),
        Some(&Outcome::Passed)
    );
}

#[tokio::test]
async fn throttling_probe_reaches_the_last_page() {
    let fake = Arc::new(FakeMTurk::new());
    let client = Client::with_transport(fake.clone());
    throttling_probe(&client).await.unwrap();

    let searches = fake.calls().iter().filter(|c| *c == "SearchHITs").count();
    assert_eq!(searches, THROTTLING_PAGES as usize);
}

#[tokio::test(start_paused = true)]
async fn slow_service_fails_the_throttling_probe_by_timeout() {
    let fake = Arc::new(FakeMTurk::new().with_latency(Duration::from_secs(2)));
    let suite = Suite::new(
        Client::with_transport(fake.clone()),
        Client::with_transport(fake),
    )
    .with_groups(&[Group::Throttling]);
    let report = suite.run().await;

    assert_eq!(
        report.outcome(Group::Throttling, "Multiple simultaneous requests"),
        Some(&Outcome::Failed("timed out after 30s".to_string()))
    );
}

#[tokio::test]
async fn legacy_probe_compares_shapes_between_clients() {
    let fake = Arc::new(FakeMTurk::new());
    let current = Client::with_transport(fake.clone());
    let legacy = Client::with_transport(fake.clone());
    legacy_probe(&current, &legacy).await.unwrap();
}

#[tokio::test]
async fn compatibility_group_goes_through_the_legacy_client() {
    let current = Arc::new(FakeMTurk::new());
    let legacy = Arc::new(FakeMTurk::new());
    let report = Suite::new(
        Client::with_transport(current.clone()),
        Client::with_transport(legacy.clone()),
    )
    .with_groups(&[Group::Legacy])
    .run()
    .await;

    assert_eq!(
        report.outcome(Group::Legacy, "v1.0 Compatibility"),
        Some(&Outcome::Passed)
    );
    assert_eq!(legacy.calls(), vec!["SearchHITs", "SearchHITs"]);
    assert_eq!(current.calls(), vec!["SearchHITs"]);
}

#[tokio::test]
async fn diverging_legacy_shape_fails_the_compatibility_group() {
    let current = Arc::new(FakeMTurk::new());
    let client = Client::with_transport(current.clone());
    client
        .create_hit(&hit_params(DEFAULT_TEMPLATE.as_ref()).unwrap())
        .await
        .unwrap();

    let report = Suite::new(client, Client::with_transport(Arc::new(FakeMTurk::new())))
        .with_groups(&[Group::Legacy])
        .run()
        .await;

    match report.outcome(Group::Legacy, "v1.0 Compatibility") {
        Some(Outcome::Failed(reason)) => {
            assert!(reason.contains("legacy response shape"), "{reason}");
        }
        other => panic!("expected a failure, got {other:?}"),
    }
}
