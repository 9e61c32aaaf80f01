//! In-memory stand-in for the requester service.
//!
//! Answers every operation the client knows with a document of the same
//! shape the real service returns: a `<Operation>Response` root holding an
//! `OperationRequest` and the result element under the operation's result
//! key, whose `Request.IsValid` says whether the call was accepted.
//!
//! Only the preconditions callers sequence around are enforced: identifiers
//! must exist, `SetHITAsReviewing` and `DisposeHIT` need a HIT that is no
//! longer assignable, qualifications must be granted before they are read,
//! updated or revoked. The sandbox account balance is the fixed 10000.00.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::Transport;
use crate::error::{Error, Result};
use crate::model::operation::{Operation, result_key_for};
use crate::model::response::HitStatus;
use crate::model::{Document, Element, Params};

/// Balance every fresh sandbox account reports.
pub const SANDBOX_BALANCE: &str = "10000.00";

const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 10;
const TIME_PERIODS: &[&str] = &["OneDay", "SevenDays", "ThirtyDays", "LifeToDate"];

/// Why the fake refused a call; becomes `Request.IsValid = False`.
#[derive(Debug)]
struct Rejection {
    code: &'static str,
    message: String,
}

type Handled = std::result::Result<Vec<Element>, Rejection>;

fn reject(code: &'static str, message: impl Into<String>) -> Rejection {
    Rejection {
        code,
        message: message.into(),
    }
}

#[derive(Debug, Clone)]
struct FakeHit {
    hit_type_id: String,
    title: String,
    status: HitStatus,
    max_assignments: u64,
    expiration: chrono::DateTime<Utc>,
    qualification_type_ids: Vec<String>,
}

#[derive(Debug, Clone)]
struct FakeHitType {
    title: String,
    notification: Option<String>,
}

#[derive(Debug, Clone)]
struct FakeQualificationType {
    name: String,
    description: String,
    status: String,
    created: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    hits: BTreeMap<String, FakeHit>,
    hit_order: Vec<String>,
    hit_types: BTreeMap<String, FakeHitType>,
    qualification_types: BTreeMap<String, FakeQualificationType>,
    /// (qualification type id, worker id) -> integer value
    qualifications: BTreeMap<(String, String), i64>,
    blocked: BTreeMap<String, String>,
    notified: BTreeMap<String, usize>,
    test_events: usize,
    calls: Vec<String>,
}

/// Fake requester service. Cheap to create; share it behind an `Arc` to
/// inspect its state after driving a client against it.
#[derive(Debug, Default)]
pub struct FakeMTurk {
    state: Mutex<State>,
    latency: Option<Duration>,
}

impl FakeMTurk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer, as a slow or throttling upstream would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Other("fake service state poisoned".to_string()))
    }

    /// Operation names received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn hit_status(&self, hit_id: &str) -> Option<HitStatus> {
        self.state()
            .ok()
            .and_then(|s| s.hits.get(hit_id).map(|h| h.status.clone()))
    }

    pub fn hit_type_of(&self, hit_id: &str) -> Option<String> {
        self.state()
            .ok()
            .and_then(|s| s.hits.get(hit_id).map(|h| h.hit_type_id.clone()))
    }

    pub fn has_qualification_type(&self, qualification_type_id: &str) -> bool {
        self.state()
            .map(|s| s.qualification_types.contains_key(qualification_type_id))
            .unwrap_or(false)
    }

    pub fn qualification_score(&self, qualification_type_id: &str, worker_id: &str) -> Option<i64> {
        self.state().ok().and_then(|s| {
            s.qualifications
                .get(&(qualification_type_id.to_string(), worker_id.to_string()))
                .copied()
        })
    }

    /// Granted qualifications of one type.
    pub fn qualification_count(&self, qualification_type_id: &str) -> usize {
        self.state()
            .map(|s| {
                s.qualifications
                    .keys()
                    .filter(|(qt, _)| qt == qualification_type_id)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_blocked(&self, worker_id: &str) -> bool {
        self.state()
            .map(|s| s.blocked.contains_key(worker_id))
            .unwrap_or(false)
    }

    /// Messages delivered to a worker through NotifyWorkers.
    pub fn notifications_for(&self, worker_id: &str) -> usize {
        self.state()
            .ok()
            .and_then(|s| s.notified.get(worker_id).copied())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Transport for FakeMTurk {
    async fn call(&self, operation: &str, params: &Params) -> Result<Document> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let op = operation.parse::<Operation>().map_err(|_| Error::Api {
            operation: operation.to_string(),
            code: "AWS.BadRequest".to_string(),
            message: format!("The operation {operation} is not supported."),
        })?;

        let handled = {
            let mut state = self.state()?;
            state.calls.push(operation.to_string());
            state.handle(op, params)
        };

        let key = result_key_for(operation);
        let result = match handled {
            Ok(children) => children
                .into_iter()
                .fold(Element::new(key).with_child(request(None)), Element::with_child),
            Err(rejection) => Element::new(key).with_child(request(Some(rejection))),
        };
        let root = Element::new(format!("{operation}Response"))
            .with_child(
                Element::new("OperationRequest")
                    .with_child(leaf("RequestId", Uuid::new_v4().to_string())),
            )
            .with_child(result);
        Ok(Document::new(operation, root))
    }

    fn describe(&self) -> String {
        "in-memory fake".to_string()
    }
}

// ---------------------------------------------------------------------------
// Element helpers
// ---------------------------------------------------------------------------

fn leaf(name: &str, text: impl Into<String>) -> Element {
    Element::new(name).with_text(text)
}

fn request(rejection: Option<Rejection>) -> Element {
    match rejection {
        None => Element::new("Request").with_child(leaf("IsValid", "True")),
        Some(r) => Element::new("Request")
            .with_child(leaf("IsValid", "False"))
            .with_child(
                Element::new("Errors").with_child(
                    Element::new("Error")
                        .with_child(leaf("Code", r.code))
                        .with_child(leaf("Message", r.message)),
                ),
            ),
    }
}

fn new_id() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    raw[..30].to_string()
}

fn timestamp(at: chrono::DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ---------------------------------------------------------------------------
// Parameter helpers
// ---------------------------------------------------------------------------

fn required(params: &Params, key: &str) -> std::result::Result<String, Rejection> {
    params.get_str(key).filter(|v| !v.is_empty()).ok_or_else(|| {
        reject(
            "AWS.MissingParameters",
            format!("Your request is missing required parameters. Required parameters include {key}."),
        )
    })
}

/// `from` plus `secs`, pinned to the latest representable instant.
fn later_by(from: chrono::DateTime<Utc>, secs: u64) -> chrono::DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC)
}

fn number(params: &Params, key: &str) -> std::result::Result<Option<u64>, Rejection> {
    params
        .get_str(key)
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                reject(
                    "AWS.ParameterOutOfRange",
                    format!("The value {raw} is invalid for {key}."),
                )
            })
        })
        .transpose()
}

fn flag(params: &Params, key: &str) -> Option<bool> {
    params.get_str(key).map(|v| v.eq_ignore_ascii_case("true"))
}

/// A parameter given either as a single value or a list of values.
fn list(params: &Params, key: &str) -> Vec<String> {
    match params.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(_) => params.get_str(key).into_iter().collect(),
        None => Vec::new(),
    }
}

/// First structure of a structured parameter (`Reward`, `Notification`, ...).
fn structure<'a>(params: &'a Params, key: &str) -> Option<&'a serde_json::Map<String, Value>> {
    match params.get(key)? {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    }
}

fn field_text(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// `(page_size, page_number)` with the service's bounds.
fn paging(params: &Params) -> std::result::Result<(u64, u64), Rejection> {
    let size = number(params, "PageSize")?.unwrap_or(DEFAULT_PAGE_SIZE);
    let page = number(params, "PageNumber")?.unwrap_or(1);
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(reject(
            "AWS.ParameterOutOfRange",
            format!("PageSize must be between 1 and {MAX_PAGE_SIZE}."),
        ));
    }
    if page == 0 {
        return Err(reject(
            "AWS.ParameterOutOfRange",
            "PageNumber must be at least 1.",
        ));
    }
    Ok((size, page))
}

/// Page header plus the page's slice of `items`.
fn page(items: Vec<Element>, size: u64, number: u64) -> Vec<Element> {
    let total = items.len();
    let skip = usize::try_from((number - 1).saturating_mul(size)).unwrap_or(usize::MAX);
    let take = usize::try_from(size).unwrap_or(usize::MAX);
    let slice: Vec<Element> = items.into_iter().skip(skip).take(take).collect();
    let mut out = vec![
        leaf("NumResults", slice.len().to_string()),
        leaf("TotalNumResults", total.to_string()),
        leaf("PageNumber", number.to_string()),
    ];
    out.extend(slice);
    out
}

fn unpaged(items: Vec<Element>) -> Vec<Element> {
    let count = items.len();
    page(items, u64::try_from(count.max(1)).unwrap_or(u64::MAX), 1)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

impl State {
    fn handle(&mut self, op: Operation, params: &Params) -> Handled {
        use Operation::*;
        match op {
            CreateHit => self.create_hit(params),
            RegisterHitType => self.register_hit_type(params),
            GetHit => self.get_hit(params),
            SearchHits => self.search_hits(params),
            GetReviewableHits => self.get_reviewable_hits(params),
            ExtendHit => self.extend_hit(params),
            ForceExpireHit => self.force_expire_hit(params),
            DisableHit => self.disable_hit(params),
            DisposeHit => self.dispose_hit(params),
            SetHitAsReviewing => self.set_hit_as_reviewing(params),
            ChangeHitTypeOfHit => self.change_hit_type_of_hit(params),
            GetAssignmentsForHit => {
                self.live_hit(&required(params, "HITId")?)?;
                let (size, number) = paging(params)?;
                Ok(page(Vec::new(), size, number))
            }
            GetBonusPayments => {
                match params.get_str("HITId") {
                    Some(hit_id) => {
                        self.live_hit(&hit_id)?;
                    }
                    None => {
                        required(params, "AssignmentId")?;
                    }
                }
                let (size, number) = paging(params)?;
                Ok(page(Vec::new(), size, number))
            }
            GetReviewResultsForHit => {
                let hit_id = required(params, "HITId")?;
                self.live_hit(&hit_id)?;
                Ok(vec![leaf("HITId", hit_id)])
            }
            BlockWorker => {
                let worker = required(params, "WorkerId")?;
                let reason = required(params, "Reason")?;
                self.blocked.insert(worker, reason);
                Ok(Vec::new())
            }
            UnblockWorker => {
                let worker = required(params, "WorkerId")?;
                self.blocked.remove(&worker);
                Ok(Vec::new())
            }
            GetBlockedWorkers => {
                let (size, number) = paging(params)?;
                let blocks = self
                    .blocked
                    .iter()
                    .map(|(worker, reason)| {
                        Element::new("WorkerBlock")
                            .with_child(leaf("WorkerId", worker.clone()))
                            .with_child(leaf("Reason", reason.clone()))
                    })
                    .collect();
                Ok(page(blocks, size, number))
            }
            NotifyWorkers => self.notify_workers(params),
            CreateQualificationType => self.create_qualification_type(params),
            GetQualificationType => {
                let id = required(params, "QualificationTypeId")?;
                self.qualification_type_element(&id)
            }
            UpdateQualificationType => self.update_qualification_type(params),
            DisposeQualificationType => {
                let id = required(params, "QualificationTypeId")?;
                self.known_qualification_type(&id)?;
                self.qualification_types.remove(&id);
                self.qualifications.retain(|(qt, _), _| *qt != id);
                Ok(Vec::new())
            }
            SearchQualificationTypes => self.search_qualification_types(params),
            GetHitsForQualificationType => {
                let id = required(params, "QualificationTypeId")?;
                self.known_qualification_type(&id)?;
                let (size, number) = paging(params)?;
                let hits = self
                    .hit_order
                    .iter()
                    .filter_map(|hit_id| self.hits.get(hit_id).map(|h| (hit_id, h)))
                    .filter(|(_, h)| h.qualification_type_ids.contains(&id))
                    .map(|(hit_id, h)| hit_element(hit_id, h))
                    .collect();
                Ok(page(hits, size, number))
            }
            GetQualificationsForQualificationType => {
                let id = required(params, "QualificationTypeId")?;
                self.known_qualification_type(&id)?;
                let (size, number) = paging(params)?;
                let granted = self
                    .qualifications
                    .iter()
                    .filter(|((qt, _), _)| *qt == id)
                    .map(|((qt, worker), value)| qualification_element(qt, worker, *value))
                    .collect();
                Ok(page(granted, size, number))
            }
            GetQualificationRequests => {
                if let Some(id) = params.get_str("QualificationTypeId") {
                    self.known_qualification_type(&id)?;
                }
                let (size, number) = paging(params)?;
                Ok(page(Vec::new(), size, number))
            }
            AssignQualification => self.assign_qualification(params),
            GetQualificationScore => {
                let id = required(params, "QualificationTypeId")?;
                let subject = required(params, "SubjectId")?;
                let value = self.granted(&id, &subject)?;
                Ok(qualification_element(&id, &subject, value)
                    .children()
                    .to_vec())
            }
            UpdateQualificationScore => {
                let id = required(params, "QualificationTypeId")?;
                let subject = required(params, "SubjectId")?;
                let value = required(params, "IntegerValue")?
                    .parse::<i64>()
                    .map_err(|_| reject("AWS.ParameterOutOfRange", "IntegerValue must be an integer."))?;
                self.granted(&id, &subject)?;
                self.qualifications.insert((id, subject), value);
                Ok(Vec::new())
            }
            RevokeQualification => {
                let id = required(params, "QualificationTypeId")?;
                let subject = required(params, "SubjectId")?;
                self.granted(&id, &subject)?;
                self.qualifications.remove(&(id, subject));
                Ok(Vec::new())
            }
            GetAccountBalance => Ok(vec![
                Element::new("AvailableBalance")
                    .with_child(leaf("Amount", SANDBOX_BALANCE))
                    .with_child(leaf("CurrencyCode", "USD"))
                    .with_child(leaf("FormattedPrice", "$10,000.00")),
            ]),
            GetRequesterStatistic => self.statistic(params, None),
            GetRequesterWorkerStatistic => {
                let worker = required(params, "WorkerId")?;
                self.statistic(params, Some(worker))
            }
            SetHitTypeNotification => self.set_hit_type_notification(params),
            SendTestEventNotification => {
                let notification = structure(params, "Notification").ok_or_else(|| {
                    reject("AWS.MissingParameters", "Notification is required.")
                })?;
                validate_notification(notification)?;
                required(params, "TestEventType")?;
                self.test_events += 1;
                Ok(Vec::new())
            }
        }
    }

    fn live_hit(&self, hit_id: &str) -> std::result::Result<&FakeHit, Rejection> {
        self.hits
            .get(hit_id)
            .filter(|h| h.status != HitStatus::Disposed)
            .ok_or_else(|| {
                reject(
                    "AWS.MechanicalTurk.HITDoesNotExist",
                    format!("Hit {hit_id} does not exist."),
                )
            })
    }

    fn live_hit_mut(&mut self, hit_id: &str) -> std::result::Result<&mut FakeHit, Rejection> {
        self.hits
            .get_mut(hit_id)
            .filter(|h| h.status != HitStatus::Disposed)
            .ok_or_else(|| {
                reject(
                    "AWS.MechanicalTurk.HITDoesNotExist",
                    format!("Hit {hit_id} does not exist."),
                )
            })
    }

    fn known_hit_type(&self, hit_type_id: &str) -> std::result::Result<&FakeHitType, Rejection> {
        self.hit_types.get(hit_type_id).ok_or_else(|| {
            reject(
                "AWS.MechanicalTurk.HITTypeDoesNotExist",
                format!("HITType {hit_type_id} does not exist."),
            )
        })
    }

    fn known_qualification_type(
        &self,
        id: &str,
    ) -> std::result::Result<&FakeQualificationType, Rejection> {
        self.qualification_types.get(id).ok_or_else(|| {
            reject(
                "AWS.MechanicalTurk.QualificationTypeDoesNotExist",
                format!("Qualification type {id} does not exist."),
            )
        })
    }

    fn granted(&self, id: &str, subject: &str) -> std::result::Result<i64, Rejection> {
        self.known_qualification_type(id)?;
        self.qualifications
            .get(&(id.to_string(), subject.to_string()))
            .copied()
            .ok_or_else(|| {
                reject(
                    "AWS.MechanicalTurk.QualificationDoesNotExist",
                    format!("You requested a Qualification that does not exist: {id} for {subject}."),
                )
            })
    }

    fn register_type(&mut self, params: &Params) -> std::result::Result<String, Rejection> {
        let title = required(params, "Title")?;
        required(params, "Description")?;
        required(params, "AssignmentDurationInSeconds")?;
        let reward = structure(params, "Reward")
            .ok_or_else(|| reject("AWS.MissingParameters", "Reward is required."))?;
        let amount = field_text(reward, "Amount")
            .and_then(|raw| raw.parse::<BigDecimal>().ok())
            .ok_or_else(|| reject("AWS.ParameterOutOfRange", "Reward.Amount is invalid."))?;
        if amount < BigDecimal::from(0) {
            return Err(reject(
                "AWS.ParameterOutOfRange",
                "Reward.Amount must not be negative.",
            ));
        }
        let id = new_id();
        self.hit_types.insert(
            id.clone(),
            FakeHitType {
                title,
                notification: None,
            },
        );
        Ok(id)
    }

    fn create_hit(&mut self, params: &Params) -> Handled {
        required(params, "Question")?;
        let lifetime = number(params, "LifetimeInSeconds")?.ok_or_else(|| {
            reject("AWS.MissingParameters", "LifetimeInSeconds is required.")
        })?;
        if !(30..=31_536_000).contains(&lifetime) {
            return Err(reject(
                "AWS.ParameterOutOfRange",
                "LifetimeInSeconds must be between 30 and 31536000.",
            ));
        }
        let hit_type_id = match params.get_str("HITTypeId") {
            Some(id) => {
                self.known_hit_type(&id)?;
                id
            }
            None => self.register_type(params)?,
        };
        let qualification_type_ids = match params.get("QualificationRequirement") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|r| r.get("QualificationTypeId").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
            Some(Value::Object(r)) => r
                .get("QualificationTypeId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };
        let title = self
            .hit_types
            .get(&hit_type_id)
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let hit_id = new_id();
        self.hits.insert(
            hit_id.clone(),
            FakeHit {
                hit_type_id: hit_type_id.clone(),
                title,
                status: HitStatus::Assignable,
                max_assignments: number(params, "MaxAssignments")?.unwrap_or(1),
                expiration: later_by(Utc::now(), lifetime),
                qualification_type_ids,
            },
        );
        self.hit_order.push(hit_id.clone());
        Ok(vec![leaf("HITId", hit_id), leaf("HITTypeId", hit_type_id)])
    }

    fn register_hit_type(&mut self, params: &Params) -> Handled {
        let id = self.register_type(params)?;
        Ok(vec![leaf("HITTypeId", id)])
    }

    fn get_hit(&self, params: &Params) -> Handled {
        let hit_id = required(params, "HITId")?;
        let hit = self.live_hit(&hit_id)?;
        Ok(hit_element(&hit_id, hit).children().to_vec())
    }

    fn search_hits(&self, params: &Params) -> Handled {
        let (size, number) = paging(params)?;
        let hits = self
            .hit_order
            .iter()
            .filter_map(|id| self.hits.get(id).map(|h| (id, h)))
            .filter(|(_, h)| h.status != HitStatus::Disposed)
            .map(|(id, h)| hit_element(id, h))
            .collect();
        Ok(page(hits, size, number))
    }

    fn get_reviewable_hits(&self, params: &Params) -> Handled {
        let (size, number) = paging(params)?;
        let type_filter = params.get_str("HITTypeId");
        let hits = self
            .hit_order
            .iter()
            .filter_map(|id| self.hits.get(id).map(|h| (id, h)))
            .filter(|(_, h)| h.status == HitStatus::Reviewable)
            .filter(|(_, h)| type_filter.as_ref().is_none_or(|t| *t == h.hit_type_id))
            .map(|(id, _)| Element::new("HIT").with_child(leaf("HITId", id.clone())))
            .collect();
        Ok(page(hits, size, number))
    }

    fn extend_hit(&mut self, params: &Params) -> Handled {
        let hit_id = required(params, "HITId")?;
        let extra_assignments = number(params, "MaxAssignmentsIncrement")?.unwrap_or(0);
        let extra_seconds = number(params, "ExpirationIncrementInSeconds")?.unwrap_or(0);
        let hit = self.live_hit_mut(&hit_id)?;
        hit.max_assignments = hit.max_assignments.saturating_add(extra_assignments);
        hit.expiration = later_by(hit.expiration, extra_seconds);
        Ok(Vec::new())
    }

    fn force_expire_hit(&mut self, params: &Params) -> Handled {
        let hit_id = required(params, "HITId")?;
        let hit = self.live_hit_mut(&hit_id)?;
        if matches!(hit.status, HitStatus::Assignable | HitStatus::Unassignable) {
            hit.status = HitStatus::Reviewable;
        }
        hit.expiration = Utc::now();
        Ok(Vec::new())
    }

    fn disable_hit(&mut self, params: &Params) -> Handled {
        let hit_id = required(params, "HITId")?;
        let hit = self.live_hit_mut(&hit_id)?;
        hit.status = HitStatus::Disposed;
        Ok(Vec::new())
    }

    fn dispose_hit(&mut self, params: &Params) -> Handled {
        let hit_id = required(params, "HITId")?;
        let hit = self.live_hit_mut(&hit_id)?;
        if !matches!(hit.status, HitStatus::Reviewable | HitStatus::Reviewing) {
            return Err(reject(
                "AWS.MechanicalTurk.InvalidHITState",
                format!("HIT {hit_id} is {} and cannot be disposed.", hit.status),
            ));
        }
        hit.status = HitStatus::Disposed;
        Ok(Vec::new())
    }

    fn set_hit_as_reviewing(&mut self, params: &Params) -> Handled {
        let hit_id = required(params, "HITId")?;
        let revert = flag(params, "Revert").unwrap_or(false);
        let hit = self.live_hit_mut(&hit_id)?;
        let (from, to) = if revert {
            (HitStatus::Reviewing, HitStatus::Reviewable)
        } else {
            (HitStatus::Reviewable, HitStatus::Reviewing)
        };
        if hit.status != from {
            return Err(reject(
                "AWS.MechanicalTurk.InvalidHITState",
                format!("HIT {hit_id} is {}, expected {from}.", hit.status),
            ));
        }
        hit.status = to;
        Ok(Vec::new())
    }

    fn change_hit_type_of_hit(&mut self, params: &Params) -> Handled {
        let hit_id = required(params, "HITId")?;
        let hit_type_id = required(params, "HITTypeId")?;
        let title = self.known_hit_type(&hit_type_id)?.title.clone();
        let hit = self.live_hit_mut(&hit_id)?;
        hit.hit_type_id = hit_type_id;
        hit.title = title;
        Ok(Vec::new())
    }

    fn notify_workers(&mut self, params: &Params) -> Handled {
        required(params, "Subject")?;
        required(params, "MessageText")?;
        let workers = list(params, "WorkerId");
        if workers.is_empty() || workers.len() > 100 {
            return Err(reject(
                "AWS.ParameterOutOfRange",
                "NotifyWorkers takes between 1 and 100 WorkerId values.",
            ));
        }
        for worker in workers {
            *self.notified.entry(worker).or_default() += 1;
        }
        Ok(Vec::new())
    }

    fn qualification_type_element(&self, id: &str) -> Handled {
        let qt = self.known_qualification_type(id)?;
        Ok(qualification_type_element(id, qt).children().to_vec())
    }

    fn create_qualification_type(&mut self, params: &Params) -> Handled {
        let name = required(params, "Name")?;
        let description = required(params, "Description")?;
        let status = required(params, "QualificationTypeStatus")?;
        validate_status(&status)?;
        if self.qualification_types.values().any(|qt| qt.name == name) {
            return Err(reject(
                "AWS.MechanicalTurk.QualificationTypeAlreadyExists",
                format!("You have already created a QualificationType with this name: {name}"),
            ));
        }
        let id = new_id();
        self.qualification_types.insert(
            id.clone(),
            FakeQualificationType {
                name,
                description,
                status,
                created: Utc::now(),
            },
        );
        self.qualification_type_element(&id)
    }

    fn update_qualification_type(&mut self, params: &Params) -> Handled {
        let id = required(params, "QualificationTypeId")?;
        let status = params.get_str("QualificationTypeStatus");
        if let Some(status) = &status {
            validate_status(status)?;
        }
        self.known_qualification_type(&id)?;
        if let Some(qt) = self.qualification_types.get_mut(&id) {
            if let Some(status) = status {
                qt.status = status;
            }
            if let Some(description) = params.get_str("Description") {
                qt.description = description;
            }
        }
        self.qualification_type_element(&id)
    }

    fn search_qualification_types(&self, params: &Params) -> Handled {
        let (size, number) = paging(params)?;
        // Every known type is owned by the caller and requestable, so
        // MustBeRequestable and MustBeOwnedByCaller never filter anything.
        let query = params.get_str("Query").map(|q| q.to_lowercase());
        let types = self
            .qualification_types
            .iter()
            .filter(|(_, qt)| {
                query
                    .as_ref()
                    .is_none_or(|q| qt.name.to_lowercase().contains(q.as_str()))
            })
            .map(|(id, qt)| qualification_type_element(id, qt))
            .collect();
        Ok(page(types, size, number))
    }

    fn assign_qualification(&mut self, params: &Params) -> Handled {
        let id = required(params, "QualificationTypeId")?;
        let worker = required(params, "WorkerId")?;
        let value = match params.get_str("IntegerValue") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                reject("AWS.ParameterOutOfRange", "IntegerValue must be an integer.")
            })?,
            None => 1,
        };
        self.known_qualification_type(&id)?;
        let key = (id, worker);
        if self.qualifications.contains_key(&key) {
            return Err(reject(
                "AWS.MechanicalTurk.QualificationAlreadyExists",
                format!("Worker {} already has this qualification.", key.1),
            ));
        }
        self.qualifications.insert(key, value);
        Ok(Vec::new())
    }

    fn statistic(&self, params: &Params, worker: Option<String>) -> Handled {
        let statistic = required(params, "Statistic")?;
        let period = required(params, "TimePeriod")?;
        if !TIME_PERIODS.contains(&period.as_str()) {
            return Err(reject(
                "AWS.ParameterOutOfRange",
                format!("TimePeriod must be one of {}.", TIME_PERIODS.join(", ")),
            ));
        }
        let value = match (statistic.as_str(), worker) {
            ("NumberHITsCreated", None) => self.hits.len(),
            ("NumberHITsAssignable", None) => self
                .hits
                .values()
                .filter(|h| h.status == HitStatus::Assignable)
                .count(),
            _ => 0,
        };
        Ok(vec![
            leaf("Statistic", statistic),
            leaf("TimePeriod", period),
            Element::new("DataPoint")
                .with_child(leaf("Date", timestamp(Utc::now())))
                .with_child(leaf("LongValue", value.to_string())),
        ])
    }

    fn set_hit_type_notification(&mut self, params: &Params) -> Handled {
        let hit_type_id = required(params, "HITTypeId")?;
        self.known_hit_type(&hit_type_id)?;
        let destination = match structure(params, "Notification") {
            Some(notification) => Some(validate_notification(notification)?),
            None => None,
        };
        let active = flag(params, "Active");
        if let Some(hit_type) = self.hit_types.get_mut(&hit_type_id) {
            if destination.is_some() {
                hit_type.notification = destination;
            }
            if active == Some(false) {
                hit_type.notification = None;
            }
        }
        Ok(Vec::new())
    }
}

fn validate_status(status: &str) -> std::result::Result<(), Rejection> {
    match status {
        "Active" | "Inactive" => Ok(()),
        other => Err(reject(
            "AWS.ParameterOutOfRange",
            format!("QualificationTypeStatus {other} is invalid."),
        )),
    }
}

/// Check a notification structure; returns its destination.
fn validate_notification(
    notification: &serde_json::Map<String, Value>,
) -> std::result::Result<String, Rejection> {
    let destination = field_text(notification, "Destination")
        .ok_or_else(|| reject("AWS.MissingParameters", "Notification.Destination is required."))?;
    match field_text(notification, "Transport").as_deref() {
        Some("Email" | "SQS" | "REST" | "SOAP") => {}
        _ => {
            return Err(reject(
                "AWS.ParameterOutOfRange",
                "Notification.Transport must be Email, SQS, REST or SOAP.",
            ));
        }
    }
    if field_text(notification, "Version").as_deref() != Some("2006-05-05") {
        return Err(reject(
            "AWS.ParameterOutOfRange",
            "Notification.Version must be 2006-05-05.",
        ));
    }
    if field_text(notification, "EventType").is_none() {
        return Err(reject(
            "AWS.MissingParameters",
            "Notification.EventType is required.",
        ));
    }
    Ok(destination)
}

fn hit_element(hit_id: &str, hit: &FakeHit) -> Element {
    Element::new("HIT")
        .with_child(leaf("HITId", hit_id))
        .with_child(leaf("HITTypeId", hit.hit_type_id.clone()))
        .with_child(leaf("Title", hit.title.clone()))
        .with_child(leaf("HITStatus", hit.status.to_string()))
        .with_child(leaf("MaxAssignments", hit.max_assignments.to_string()))
        .with_child(leaf("Expiration", timestamp(hit.expiration)))
}

fn qualification_type_element(id: &str, qt: &FakeQualificationType) -> Element {
    Element::new("QualificationType")
        .with_child(leaf("QualificationTypeId", id))
        .with_child(leaf("CreationTime", timestamp(qt.created)))
        .with_child(leaf("Name", qt.name.clone()))
        .with_child(leaf("Description", qt.description.clone()))
        .with_child(leaf("QualificationTypeStatus", qt.status.clone()))
        .with_child(leaf("AutoGranted", "0"))
}

fn qualification_element(qualification_type_id: &str, subject_id: &str, value: i64) -> Element {
    Element::new("Qualification")
        .with_child(leaf("QualificationTypeId", qualification_type_id))
        .with_child(leaf("SubjectId", subject_id))
        .with_child(leaf("IntegerValue", value.to_string()))
        .with_child(leaf("Status", "Granted"))
}
