//! One typed method per requester operation.

use std::time::Duration;

use super::Client;
use crate::error::Result;
use crate::model::{
    AccountBalance, Ack, Assignment, BonusPayment, Hit, HitFromType, HitParams, HitTypeParams,
    HitTypeRegistration, NewQualificationType, Notification, Operation, Page, PageRequest, Params,
    Qualification, QualificationRequest, QualificationType, QualificationTypeStatus,
    RequesterStatistic, WorkerBlock,
};

fn hit(hit_id: &str) -> Params {
    Params::new().with("HITId", hit_id)
}

fn qualification_type(qualification_type_id: &str) -> Params {
    Params::new().with("QualificationTypeId", qualification_type_id)
}

fn subject(qualification_type_id: &str, subject_id: &str) -> Params {
    qualification_type(qualification_type_id).with("SubjectId", subject_id)
}

fn notification(notification: &Notification) -> Result<serde_json::Value> {
    Ok(serde_json::Value::Array(vec![
        Params::from_serialize(notification)?.into(),
    ]))
}

impl Client {
    // -- HITs ---------------------------------------------------------------

    pub async fn create_hit(&self, hit: &HitParams) -> Result<Hit> {
        self.call(Operation::CreateHit, Params::from_serialize(hit)?)
            .await
    }

    /// Create a HIT under an already registered HIT type.
    pub async fn create_hit_from_type(&self, hit: &HitFromType) -> Result<Hit> {
        self.call(Operation::CreateHit, Params::from_serialize(hit)?)
            .await
    }

    pub async fn register_hit_type(&self, hit_type: &HitTypeParams) -> Result<HitTypeRegistration> {
        self.call(Operation::RegisterHitType, Params::from_serialize(hit_type)?)
            .await
    }

    pub async fn get_hit(&self, hit_id: &str) -> Result<Hit> {
        self.call(Operation::GetHit, hit(hit_id)).await
    }

    pub async fn search_hits(&self, page: PageRequest) -> Result<Page<Hit>> {
        self.call(Operation::SearchHits, page.apply(Params::new()))
            .await
    }

    pub async fn get_reviewable_hits(&self, page: PageRequest) -> Result<Page<Hit>> {
        self.call(Operation::GetReviewableHits, page.apply(Params::new()))
            .await
    }

    /// Add assignments and/or lifetime to a HIT. Both are optional.
    pub async fn extend_hit(
        &self,
        hit_id: &str,
        extra_assignments: Option<u32>,
        extra_lifetime: Option<Duration>,
    ) -> Result<Ack> {
        let mut params = hit(hit_id);
        if let Some(n) = extra_assignments {
            params = params.with("MaxAssignmentsIncrement", n);
        }
        if let Some(d) = extra_lifetime {
            params = params.with("ExpirationIncrementInSeconds", d.as_secs());
        }
        self.call(Operation::ExtendHit, params).await
    }

    pub async fn force_expire_hit(&self, hit_id: &str) -> Result<Ack> {
        self.call(Operation::ForceExpireHit, hit(hit_id)).await
    }

    pub async fn disable_hit(&self, hit_id: &str) -> Result<Ack> {
        self.call(Operation::DisableHit, hit(hit_id)).await
    }

    /// Only reviewable or reviewing HITs can be disposed.
    pub async fn dispose_hit(&self, hit_id: &str) -> Result<Ack> {
        self.call(Operation::DisposeHit, hit(hit_id)).await
    }

    /// Move a reviewable HIT to reviewing, or back when `revert` is set.
    pub async fn set_hit_as_reviewing(&self, hit_id: &str, revert: bool) -> Result<Ack> {
        let params = if revert {
            hit(hit_id).with("Revert", true)
        } else {
            hit(hit_id)
        };
        self.call(Operation::SetHitAsReviewing, params).await
    }

    pub async fn change_hit_type_of_hit(&self, hit_id: &str, hit_type_id: &str) -> Result<Ack> {
        self.call(
            Operation::ChangeHitTypeOfHit,
            hit(hit_id).with("HITTypeId", hit_type_id),
        )
        .await
    }

    pub async fn get_assignments_for_hit(
        &self,
        hit_id: &str,
        page: PageRequest,
    ) -> Result<Page<Assignment>> {
        self.call(Operation::GetAssignmentsForHit, page.apply(hit(hit_id)))
            .await
    }

    pub async fn get_bonus_payments(
        &self,
        hit_id: &str,
        page: PageRequest,
    ) -> Result<Page<BonusPayment>> {
        self.call(Operation::GetBonusPayments, page.apply(hit(hit_id)))
            .await
    }

    pub async fn get_review_results_for_hit(&self, hit_id: &str) -> Result<Ack> {
        self.call(Operation::GetReviewResultsForHit, hit(hit_id))
            .await
    }

    // -- Workers ------------------------------------------------------------

    pub async fn block_worker(&self, worker_id: &str, reason: &str) -> Result<Ack> {
        let params = Params::new()
            .with("WorkerId", worker_id)
            .with("Reason", reason);
        self.call(Operation::BlockWorker, params).await
    }

    pub async fn unblock_worker(&self, worker_id: &str, reason: Option<&str>) -> Result<Ack> {
        let mut params = Params::new().with("WorkerId", worker_id);
        if let Some(reason) = reason {
            params = params.with("Reason", reason);
        }
        self.call(Operation::UnblockWorker, params).await
    }

    pub async fn get_blocked_workers(&self, page: PageRequest) -> Result<Page<WorkerBlock>> {
        self.call(Operation::GetBlockedWorkers, page.apply(Params::new()))
            .await
    }

    /// Message up to 100 workers at once.
    pub async fn notify_workers(
        &self,
        subject: &str,
        message: &str,
        worker_ids: &[&str],
    ) -> Result<Ack> {
        let params = Params::new()
            .with("Subject", subject)
            .with("MessageText", message)
            .with("WorkerId", worker_ids.to_vec());
        self.call(Operation::NotifyWorkers, params).await
    }

    // -- Qualifications -----------------------------------------------------

    pub async fn create_qualification_type(
        &self,
        new: &NewQualificationType,
    ) -> Result<QualificationType> {
        self.call(
            Operation::CreateQualificationType,
            Params::from_serialize(new)?,
        )
        .await
    }

    pub async fn get_qualification_type(&self, id: &str) -> Result<QualificationType> {
        self.call(Operation::GetQualificationType, qualification_type(id))
            .await
    }

    pub async fn update_qualification_type(
        &self,
        id: &str,
        status: QualificationTypeStatus,
    ) -> Result<QualificationType> {
        let params = qualification_type(id).with("QualificationTypeStatus", status.as_str());
        self.call(Operation::UpdateQualificationType, params).await
    }

    pub async fn dispose_qualification_type(&self, id: &str) -> Result<Ack> {
        self.call(Operation::DisposeQualificationType, qualification_type(id))
            .await
    }

    pub async fn search_qualification_types(
        &self,
        must_be_requestable: bool,
        page: PageRequest,
    ) -> Result<Page<QualificationType>> {
        let params = page.apply(Params::new().with("MustBeRequestable", must_be_requestable));
        self.call(Operation::SearchQualificationTypes, params).await
    }

    pub async fn get_hits_for_qualification_type(
        &self,
        id: &str,
        page: PageRequest,
    ) -> Result<Page<Hit>> {
        self.call(
            Operation::GetHitsForQualificationType,
            page.apply(qualification_type(id)),
        )
        .await
    }

    pub async fn get_qualifications_for_qualification_type(
        &self,
        id: &str,
        page: PageRequest,
    ) -> Result<Page<Qualification>> {
        self.call(
            Operation::GetQualificationsForQualificationType,
            page.apply(qualification_type(id)),
        )
        .await
    }

    /// Pending requests, for one qualification type or all of them.
    pub async fn get_qualification_requests(
        &self,
        id: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<QualificationRequest>> {
        let params = match id {
            Some(id) => qualification_type(id),
            None => Params::new(),
        };
        self.call(Operation::GetQualificationRequests, page.apply(params))
            .await
    }

    /// Grant a qualification; the service defaults the value to 1.
    pub async fn assign_qualification(
        &self,
        id: &str,
        worker_id: &str,
        value: Option<i64>,
    ) -> Result<Ack> {
        let mut params = qualification_type(id).with("WorkerId", worker_id);
        if let Some(value) = value {
            params = params.with("IntegerValue", value);
        }
        self.call(Operation::AssignQualification, params).await
    }

    pub async fn get_qualification_score(
        &self,
        id: &str,
        subject_id: &str,
    ) -> Result<Qualification> {
        self.call(Operation::GetQualificationScore, subject(id, subject_id))
            .await
    }

    pub async fn update_qualification_score(
        &self,
        id: &str,
        subject_id: &str,
        value: i64,
    ) -> Result<Ack> {
        self.call(
            Operation::UpdateQualificationScore,
            subject(id, subject_id).with("IntegerValue", value),
        )
        .await
    }

    pub async fn revoke_qualification(
        &self,
        id: &str,
        subject_id: &str,
        reason: &str,
    ) -> Result<Ack> {
        self.call(
            Operation::RevokeQualification,
            subject(id, subject_id).with("Reason", reason),
        )
        .await
    }

    // -- Account ------------------------------------------------------------

    pub async fn get_account_balance(&self) -> Result<AccountBalance> {
        self.call(Operation::GetAccountBalance, Params::new()).await
    }

    pub async fn get_requester_statistic(
        &self,
        statistic: &str,
        time_period: &str,
    ) -> Result<RequesterStatistic> {
        let params = Params::new()
            .with("Statistic", statistic)
            .with("TimePeriod", time_period);
        self.call(Operation::GetRequesterStatistic, params).await
    }

    pub async fn get_requester_worker_statistic(
        &self,
        statistic: &str,
        time_period: &str,
        worker_id: &str,
    ) -> Result<RequesterStatistic> {
        let params = Params::new()
            .with("Statistic", statistic)
            .with("TimePeriod", time_period)
            .with("WorkerId", worker_id);
        self.call(Operation::GetRequesterWorkerStatistic, params)
            .await
    }

    // -- Notifications ------------------------------------------------------

    pub async fn set_hit_type_notification(
        &self,
        hit_type_id: &str,
        subscription: &Notification,
        active: Option<bool>,
    ) -> Result<Ack> {
        let mut params = Params::new()
            .with("HITTypeId", hit_type_id)
            .with("Notification", notification(subscription)?);
        if let Some(active) = active {
            params = params.with("Active", active);
        }
        self.call(Operation::SetHitTypeNotification, params).await
    }

    /// Ask the service to deliver a test event to `subscription`. Needs a
    /// destination the caller actually controls.
    pub async fn send_test_event_notification(
        &self,
        subscription: &Notification,
        test_event_type: &str,
    ) -> Result<Ack> {
        let params = Params::new()
            .with("Notification", notification(subscription)?)
            .with("TestEventType", test_event_type);
        self.call(Operation::SendTestEventNotification, params)
            .await
    }
}
