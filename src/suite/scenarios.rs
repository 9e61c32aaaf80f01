//! Scenario bodies, one function per group.

use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use serde_json::json;

use super::{
    Context, ExpiredHitFixture, Group, HitAndTypeFixture, HitFixture, HitTypeFixture,
    NOTIFICATION_SKIP_REASON, QualificationFixture, Report, ScenarioResult, ensure,
};
use crate::client::Client;
use crate::fixture::hit_params;
use crate::model::{
    Element, HitFromType, Notification, PageRequest, QualificationTypeStatus,
};

/// Balance the sandbox reports for every account.
const SANDBOX_BALANCE: u32 = 10_000;

/// Pages requested by the throttling probe before giving up.
pub const THROTTLING_PAGES: u32 = 30;

pub(super) async fn run_group(group: Group, ctx: &Context, report: &mut Report) {
    match group {
        Group::Standalone => standalone(ctx, report).await,
        Group::Qualification => qualification(ctx, report).await,
        Group::Hits => hits(ctx, report).await,
        Group::ExpiredHit => expired_hit(ctx, report).await,
        Group::HitType => hit_type(ctx, report).await,
        Group::HitAndType => hit_and_type(ctx, report).await,
        Group::Notification => {
            report.skip(group, "SendTestEventNotification", NOTIFICATION_SKIP_REASON);
        }
        Group::Throttling => {
            report
                .run(group, "Multiple simultaneous requests", throttling_probe(&ctx.client))
                .await;
        }
        Group::Legacy => {
            report
                .run(group, "v1.0 Compatibility", legacy_probe(&ctx.client, &ctx.legacy))
                .await;
        }
    }
}

async fn standalone(ctx: &Context, report: &mut Report) {
    let g = Group::Standalone;
    let client = &ctx.client;
    let worker = ctx.worker_id.as_str();

    report
        .run(g, "CreateHIT", async {
            let hit = client.create_hit(&hit_params(&ctx.template)?).await?;
            ensure(!hit.hit_id.is_empty(), || "HITId is empty".to_string())
        })
        .await;
    report
        .run(g, "RegisterHITType", async {
            let registered = client
                .register_hit_type(&hit_params(&ctx.template)?.hit_type())
                .await?;
            ensure(!registered.hit_type_id.is_empty(), || {
                "HITTypeId is empty".to_string()
            })
        })
        .await;
    report
        .run(g, "BlockWorker", async {
            client.block_worker(worker, "Testing block operation").await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetBlockedWorkers", async {
            client.get_blocked_workers(PageRequest::default()).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "UnblockWorker", async {
            client.unblock_worker(worker, None).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetAccountBalance", async {
            let balance = client.get_account_balance().await?;
            if ctx.expect_sandbox_balance {
                let amount = &balance.available_balance.amount;
                ensure(*amount == BigDecimal::from(SANDBOX_BALANCE), || {
                    format!("sandbox balance should be {SANDBOX_BALANCE}, got {amount}")
                })?;
            }
            Ok(())
        })
        .await;
    report
        .run(g, "GetQualificationRequests", async {
            client
                .get_qualification_requests(None, PageRequest::default())
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetRequesterStatistic", async {
            client
                .get_requester_statistic("NumberAssignmentsApproved", "ThirtyDays")
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetRequesterWorkerStatistic", async {
            client
                .get_requester_worker_statistic("NumberAssignmentsApproved", "ThirtyDays", worker)
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetReviewableHITs", async {
            client.get_reviewable_hits(PageRequest::default()).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "NotifyWorkers", async {
            client
                .notify_workers("Example Subject", "Example Message Text", &[worker])
                .await?;
            Ok(())
        })
        .await;
}

/// Strictly ordered: every step works on the type the first step created.
async fn qualification(ctx: &Context, report: &mut Report) {
    let g = Group::Qualification;
    let client = &ctx.client;
    let worker = ctx.worker_id.as_str();

    let Some(mut fixture) = report
        .run(g, "CreateQualificationType", QualificationFixture::setup(client))
        .await
    else {
        for name in &g.scenarios()[1..] {
            report.fail(g, name, "requires CreateQualificationType");
        }
        return;
    };
    let id = fixture.qualification_type_id.clone();
    let id = id.as_str();

    report
        .run(g, "SearchQualificationTypes - MustBeRequestable = true", async {
            client
                .search_qualification_types(true, PageRequest::default())
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "SearchQualificationTypes - MustBeRequestable = false", async {
            client
                .search_qualification_types(false, PageRequest::default())
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetHITsForQualificationType", async {
            client
                .get_hits_for_qualification_type(id, PageRequest::default())
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetQualificationsForQualificationType", async {
            client
                .get_qualifications_for_qualification_type(id, PageRequest::default())
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "AssignQualification", async {
            client.assign_qualification(id, worker, None).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetQualificationScore", async {
            let score = client.get_qualification_score(id, worker).await?;
            ensure(score.subject_id == worker, || {
                format!("score belongs to {}, not {worker}", score.subject_id)
            })
        })
        .await;
    report
        .run(g, "GetQualificationType", async {
            let qt = client.get_qualification_type(id).await?;
            ensure(qt.qualification_type_id == id, || {
                format!("asked for {id}, got {}", qt.qualification_type_id)
            })
        })
        .await;
    report
        .run(g, "UpdateQualificationType", async {
            client
                .update_qualification_type(id, QualificationTypeStatus::Active)
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "UpdateQualificationScore", async {
            client.update_qualification_score(id, worker, 5).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "RevokeQualification", async {
            client
                .revoke_qualification(id, worker, "Example Reason")
                .await?;
            Ok(())
        })
        .await;
    let disposed = report
        .run(g, "DisposeQualificationType", async {
            client.dispose_qualification_type(id).await?;
            Ok(())
        })
        .await;
    if disposed.is_some() {
        fixture.disposed();
    }
    fixture.teardown(client).await;
}

async fn hits(ctx: &Context, report: &mut Report) {
    let g = Group::Hits;
    let client = &ctx.client;
    let Some(HitFixture { hit_id }) = report
        .setup(g, HitFixture::setup(client, &ctx.template))
        .await
    else {
        return;
    };
    let hit_id = hit_id.as_str();

    report
        .run(g, "SearchHITs", async {
            let page = client.search_hits(PageRequest::size(1)).await?;
            let first = page.first().map(|hit| hit.hit_id.as_str());
            ensure(first.is_some_and(|id| !id.is_empty()), || {
                "SearchHITs returned no HITId".to_string()
            })
        })
        .await;
    report
        .run(g, "GetHIT", async {
            let hit = client.get_hit(hit_id).await?;
            ensure(hit.hit_id == hit_id, || {
                format!("asked for {hit_id}, got {}", hit.hit_id)
            })
        })
        .await;
    report
        .run(g, "GetBonusPayments", async {
            client
                .get_bonus_payments(hit_id, PageRequest::default())
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetAssignmentsForHIT", async {
            client
                .get_assignments_for_hit(hit_id, PageRequest::default())
                .await?;
            Ok(())
        })
        .await;
    report
        .run(g, "ExtendHIT", async {
            let fresh = HitFixture::setup(client, &ctx.template).await?;
            client.extend_hit(&fresh.hit_id, None, None).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "GetReviewResultsForHIT", async {
            client.get_review_results_for_hit(hit_id).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "ForceExpireHIT", async {
            client.force_expire_hit(hit_id).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "DisableHIT", async {
            let fresh = HitFixture::setup(client, &ctx.template).await?;
            client.disable_hit(&fresh.hit_id).await?;
            Ok(())
        })
        .await;
}

async fn expired_hit(ctx: &Context, report: &mut Report) {
    let g = Group::ExpiredHit;
    let client = &ctx.client;
    let Some(ExpiredHitFixture { hit_id }) = report
        .setup(g, ExpiredHitFixture::setup(client, &ctx.template))
        .await
    else {
        return;
    };

    report
        .run(g, "SetHITAsReviewing", async {
            client.set_hit_as_reviewing(&hit_id, false).await?;
            Ok(())
        })
        .await;
    report
        .run(g, "DisposeHIT", async {
            client.dispose_hit(&hit_id).await?;
            Ok(())
        })
        .await;
}

async fn hit_type(ctx: &Context, report: &mut Report) {
    let g = Group::HitType;
    let client = &ctx.client;
    let Some(HitTypeFixture { hit_type_id }) = report
        .setup(g, HitTypeFixture::setup(client, &ctx.template))
        .await
    else {
        return;
    };

    report
        .run(g, "CreateHIT with HITTypeId", async {
            let hit = client
                .create_hit_from_type(&HitFromType {
                    hit_type_id: hit_type_id.clone(),
                    question: hit_params(&ctx.template)?.question,
                    lifetime_in_seconds: 3600,
                    max_assignments: None,
                })
                .await?;
            ensure(!hit.hit_id.is_empty(), || "HITId is empty".to_string())
        })
        .await;
    report
        .run(g, "SetHITTypeNotification", async {
            let subscription =
                Notification::email("janedoe@example.com", &["AssignmentSubmitted"]);
            client
                .set_hit_type_notification(&hit_type_id, &subscription, None)
                .await?;
            Ok(())
        })
        .await;
}

async fn hit_and_type(ctx: &Context, report: &mut Report) {
    let g = Group::HitAndType;
    let client = &ctx.client;
    let Some(HitAndTypeFixture {
        hit_id,
        hit_type_id,
    }) = report
        .setup(g, HitAndTypeFixture::setup(client, &ctx.template))
        .await
    else {
        return;
    };

    report
        .run(g, "ChangeHITTypeOfHIT", async {
            client.change_hit_type_of_hit(&hit_id, &hit_type_id).await?;
            Ok(())
        })
        .await;
}

/// Page through SearchHITs until the service reports page
/// [`THROTTLING_PAGES`]. The caller bounds the whole probe in time.
pub async fn throttling_probe(client: &Client) -> ScenarioResult {
    for page_number in 1..=THROTTLING_PAGES {
        let page = client
            .search_hits(PageRequest::size(100).page(page_number))
            .await?;
        if page.page_number == Some(THROTTLING_PAGES) {
            return Ok(());
        }
    }
    ensure(false, || {
        format!("page {THROTTLING_PAGES} not reached within {THROTTLING_PAGES} requests")
    })
}

/// A client from the legacy constructor must answer like a current one.
pub async fn legacy_probe(current: &Client, legacy: &Client) -> ScenarioResult {
    let page = legacy.search_hits(PageRequest::size(1)).await?;
    ensure(page.request.is_valid, || {
        "legacy SearchHITs was not valid".to_string()
    })?;

    let params = json!({"PageSize": 1});
    let old = legacy.req("SearchHITs", params.clone()).await?;
    let new = current.req("SearchHITs", params).await?;
    let old_shape = shape(old.result("SearchHITsResult")?);
    let new_shape = shape(new.result("SearchHITsResult")?);
    ensure(old_shape == new_shape, || {
        format!("legacy response shape {old_shape:?} differs from {new_shape:?}")
    })
}

/// Dotted paths of every element below `el`, ignoring text and repeats.
fn shape(el: &Element) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    collect_paths(el, "", &mut paths);
    paths
}

fn collect_paths(el: &Element, prefix: &str, paths: &mut BTreeSet<String>) {
    for child in el.children() {
        let path = if prefix.is_empty() {
            child.name().to_string()
        } else {
            format!("{prefix}.{}", child.name())
        };
        collect_paths(child, &path, paths);
        paths.insert(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_ignores_values_and_repeats() {
        let a = Element::new("R")
            .with_child(Element::new("Request").with_child(Element::new("IsValid").with_text("True")))
            .with_child(Element::new("HIT").with_child(Element::new("HITId").with_text("A")))
            .with_child(Element::new("HIT").with_child(Element::new("HITId").with_text("B")));
        let b = Element::new("R")
            .with_child(Element::new("Request").with_child(Element::new("IsValid").with_text("True")))
            .with_child(Element::new("HIT").with_child(Element::new("HITId").with_text("C")));
        assert_eq!(shape(&a), shape(&b));
        assert!(shape(&a).contains("HIT.HITId"));
    }
}
