//! Typed client operations against the in-memory service.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use mturk_rs::Error;
use mturk_rs::client::Client;
use mturk_rs::fixture::{DEFAULT_TEMPLATE, hit_params};
use mturk_rs::model::{
    HitFromType, HitParams, HitStatus, NewQualificationType, Notification, PageRequest,
    QualificationTypeStatus,
};
use mturk_rs::transport::fake::FakeMTurk;
use serde_json::json;

const WORKER: &str = "A2Q1RSC9MWUTL2";

fn setup() -> (Arc<FakeMTurk>, Client) {
    let fake = Arc::new(FakeMTurk::new());
    let client = Client::with_transport(fake.clone());
    (fake, client)
}

fn params() -> HitParams {
    hit_params(DEFAULT_TEMPLATE.as_ref()).unwrap()
}

fn qualification(name: &str) -> NewQualificationType {
    NewQualificationType {
        name: name.to_string(),
        description: "THIS IS A SANDBOX QUALIFICATION FOR TESTING PURPOSES".to_string(),
        qualification_type_status: QualificationTypeStatus::Active,
        keywords: None,
    }
}

#[tokio::test]
async fn create_hit_returns_a_valid_hit() {
    let (fake, client) = setup();
    let hit = client.create_hit(&params()).await.unwrap();
    assert!(hit.request.unwrap().is_valid);
    assert_eq!(fake.hit_status(&hit.hit_id), Some(HitStatus::Assignable));

    let fetched = client.get_hit(&hit.hit_id).await.unwrap();
    assert_eq!(fetched.title.as_deref(), Some("EXAMPLE"));
    assert_eq!(fetched.status, Some(HitStatus::Assignable));
    assert_eq!(fetched.max_assignments, Some(1));
}

#[tokio::test]
async fn unknown_hit_is_rejected_with_the_service_error() {
    let (_, client) = setup();
    match client.get_hit("NOPE").await.unwrap_err() {
        Error::Rejected { operation, errors } => {
            assert_eq!(operation, "GetHIT");
            assert_eq!(errors[0].code, "AWS.MechanicalTurk.HITDoesNotExist");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn raw_requests_are_not_validated() {
    let (_, client) = setup();
    let doc = client
        .req("GetHIT", json!({"HITId": "NOPE"}))
        .await
        .unwrap();
    let json = doc.to_json();
    assert_eq!(json["HIT"][0]["Request"][0]["IsValid"][0], "False");

    // Unknown operations still reach the transport; the fake refuses them
    // as a whole.
    let err = client.req("ApproveEverything", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::Api { .. }));
}

#[tokio::test]
async fn raw_search_matches_the_legacy_shape() {
    let (_, client) = setup();
    client.create_hit(&params()).await.unwrap();
    let doc = client
        .req("SearchHITs", json!({"PageSize": 1}))
        .await
        .unwrap();
    let json = doc.to_json();
    let hit_id = &json["SearchHITsResult"][0]["HIT"][0]["HITId"][0];
    assert!(hit_id.as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn hit_type_registration_and_creation_from_type() {
    let (fake, client) = setup();
    let registered = client
        .register_hit_type(&params().hit_type())
        .await
        .unwrap();
    assert!(registered.request.is_valid);

    let hit = client
        .create_hit_from_type(&HitFromType {
            hit_type_id: registered.hit_type_id.clone(),
            question: params().question,
            lifetime_in_seconds: 3600,
            max_assignments: None,
        })
        .await
        .unwrap();
    assert_eq!(fake.hit_type_of(&hit.hit_id), Some(registered.hit_type_id));

    let err = client
        .create_hit_from_type(&HitFromType {
            hit_type_id: "MISSING".to_string(),
            question: params().question,
            lifetime_in_seconds: 3600,
            max_assignments: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Rejected { .. }));
}

#[tokio::test]
async fn change_hit_type_moves_the_hit() {
    let (fake, client) = setup();
    let hit_type = client
        .register_hit_type(&params().hit_type())
        .await
        .unwrap();
    let hit = client.create_hit(&params()).await.unwrap();
    assert_ne!(fake.hit_type_of(&hit.hit_id).as_ref(), Some(&hit_type.hit_type_id));

    client
        .change_hit_type_of_hit(&hit.hit_id, &hit_type.hit_type_id)
        .await
        .unwrap();
    assert_eq!(fake.hit_type_of(&hit.hit_id), Some(hit_type.hit_type_id));
}

#[tokio::test]
async fn expired_hits_can_be_reviewed_then_disposed() {
    let (fake, client) = setup();
    let hit = client.create_hit(&params()).await.unwrap();

    // Still assignable: neither reviewing nor disposing is allowed.
    assert!(client.set_hit_as_reviewing(&hit.hit_id, false).await.is_err());
    assert!(client.dispose_hit(&hit.hit_id).await.is_err());

    client.force_expire_hit(&hit.hit_id).await.unwrap();
    assert_eq!(fake.hit_status(&hit.hit_id), Some(HitStatus::Reviewable));

    let reviewable = client
        .get_reviewable_hits(PageRequest::default())
        .await
        .unwrap();
    assert_eq!(reviewable.first().map(|h| h.hit_id.as_str()), Some(hit.hit_id.as_str()));

    client.set_hit_as_reviewing(&hit.hit_id, false).await.unwrap();
    assert_eq!(fake.hit_status(&hit.hit_id), Some(HitStatus::Reviewing));
    client.set_hit_as_reviewing(&hit.hit_id, true).await.unwrap();
    client.set_hit_as_reviewing(&hit.hit_id, false).await.unwrap();

    client.dispose_hit(&hit.hit_id).await.unwrap();
    assert_eq!(fake.hit_status(&hit.hit_id), Some(HitStatus::Disposed));
    assert!(client.get_hit(&hit.hit_id).await.is_err());
}

#[tokio::test]
async fn hit_listings_and_extensions() {
    let (fake, client) = setup();
    let hit = client.create_hit(&params()).await.unwrap();

    let assignments = client
        .get_assignments_for_hit(&hit.hit_id, PageRequest::default())
        .await
        .unwrap();
    assert!(assignments.items.is_empty());
    let bonuses = client
        .get_bonus_payments(&hit.hit_id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(bonuses.num_results, Some(0));
    client.get_review_results_for_hit(&hit.hit_id).await.unwrap();

    client
        .extend_hit(&hit.hit_id, Some(2), Some(std::time::Duration::from_secs(3600)))
        .await
        .unwrap();
    assert_eq!(client.get_hit(&hit.hit_id).await.unwrap().max_assignments, Some(3));

    client.disable_hit(&hit.hit_id).await.unwrap();
    assert_eq!(fake.hit_status(&hit.hit_id), Some(HitStatus::Disposed));
}

#[tokio::test]
async fn search_pages_report_the_requested_page_number() {
    let (_, client) = setup();
    for _ in 0..3 {
        client.create_hit(&params()).await.unwrap();
    }
    let page = client.search_hits(PageRequest::size(2).page(2)).await.unwrap();
    assert_eq!(page.page_number, Some(2));
    assert_eq!(page.num_results, Some(1));
    assert_eq!(page.total_num_results, Some(3));

    let err = client.search_hits(PageRequest::size(500)).await.unwrap_err();
    assert!(matches!(err, Error::Rejected { .. }));
}

#[tokio::test]
async fn blocking_and_notifying_workers() {
    let (fake, client) = setup();
    client
        .block_worker(WORKER, "Testing block operation")
        .await
        .unwrap();
    assert!(fake.is_blocked(WORKER));
    let blocked = client
        .get_blocked_workers(PageRequest::default())
        .await
        .unwrap();
    assert_eq!(blocked.first().map(|b| b.worker_id.as_str()), Some(WORKER));
    assert_eq!(
        blocked.first().and_then(|b| b.reason.as_deref()),
        Some("Testing block operation")
    );

    client.unblock_worker(WORKER, None).await.unwrap();
    assert!(!fake.is_blocked(WORKER));

    client
        .notify_workers("Example Subject", "Example Message Text", &[WORKER])
        .await
        .unwrap();
    assert_eq!(fake.notifications_for(WORKER), 1);
    assert!(client.notify_workers("s", "m", &[]).await.is_err());
}

#[tokio::test]
async fn account_balance_and_statistics() {
    let (_, client) = setup();
    let balance = client.get_account_balance().await.unwrap();
    assert_eq!(balance.available_balance.amount, BigDecimal::from(10_000));
    assert_eq!(balance.available_balance.currency_code, "USD");

    let stat = client
        .get_requester_statistic("NumberAssignmentsApproved", "ThirtyDays")
        .await
        .unwrap();
    assert_eq!(stat.statistic.as_deref(), Some("NumberAssignmentsApproved"));
    assert_eq!(stat.data_points.len(), 1);

    client
        .get_requester_worker_statistic("NumberAssignmentsApproved", "ThirtyDays", WORKER)
        .await
        .unwrap();
    assert!(
        client
            .get_requester_statistic("NumberAssignmentsApproved", "Forever")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn qualification_lifecycle() {
    let (fake, client) = setup();
    let qt = client
        .create_qualification_type(&qualification("SANDBOX_QUALIFICATION_6"))
        .await
        .unwrap();
    let id = qt.qualification_type_id.as_str();
    assert_eq!(qt.status, Some(QualificationTypeStatus::Active));

    // Names are unique per requester.
    assert!(
        client
            .create_qualification_type(&qualification("SANDBOX_QUALIFICATION_6"))
            .await
            .is_err()
    );

    let found = client
        .search_qualification_types(true, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(found.items.len(), 1);
    client
        .get_hits_for_qualification_type(id, PageRequest::default())
        .await
        .unwrap();

    client.assign_qualification(id, WORKER, None).await.unwrap();
    let granted = client
        .get_qualifications_for_qualification_type(id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(granted.first().map(|q| q.subject_id.as_str()), Some(WORKER));

    let score = client.get_qualification_score(id, WORKER).await.unwrap();
    assert_eq!(score.integer_value, Some(1));
    client.update_qualification_score(id, WORKER, 5).await.unwrap();
    assert_eq!(fake.qualification_score(id, WORKER), Some(5));

    let updated = client
        .update_qualification_type(id, QualificationTypeStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(updated.status, Some(QualificationTypeStatus::Inactive));
    assert_eq!(
        client.get_qualification_type(id).await.unwrap().name.as_deref(),
        Some("SANDBOX_QUALIFICATION_6")
    );

    client
        .revoke_qualification(id, WORKER, "Example Reason")
        .await
        .unwrap();
    assert!(client.get_qualification_score(id, WORKER).await.is_err());

    client.dispose_qualification_type(id).await.unwrap();
    assert!(!fake.has_qualification_type(id));
    assert!(client.get_qualification_type(id).await.is_err());
}

#[tokio::test]
async fn qualification_requests_need_a_known_type() {
    let (_, client) = setup();
    let all = client
        .get_qualification_requests(None, PageRequest::default())
        .await
        .unwrap();
    assert!(all.items.is_empty());
    assert!(
        client
            .get_qualification_requests(Some("MISSING"), PageRequest::default())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn notification_subscriptions_are_validated() {
    let (_, client) = setup();
    let hit_type = client
        .register_hit_type(&params().hit_type())
        .await
        .unwrap();
    let subscription = Notification::email("janedoe@example.com", &["AssignmentSubmitted"]);
    client
        .set_hit_type_notification(&hit_type.hit_type_id, &subscription, None)
        .await
        .unwrap();

    let mut stale = subscription.clone();
    stale.version = "2005-01-01".to_string();
    assert!(
        client
            .set_hit_type_notification(&hit_type.hit_type_id, &stale, Some(true))
            .await
            .is_err()
    );

    let ping = Notification::email("janedoe@example.com", &["Ping"]);
    client
        .send_test_event_notification(&ping, "Ping")
        .await
        .unwrap();
}
