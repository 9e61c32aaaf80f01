//! Typed, validated views of operation results.
//!
//! Every decoder takes the first element under the operation's result key
//! and checks the fields it needs, so a malformed response fails here
//! instead of deep inside a caller.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::document::Element;
use crate::error::{Error, Result};

/// Decode a typed value from a result element.
pub trait FromResult: Sized {
    fn from_result(operation: &str, el: &Element) -> Result<Self>;
}

/// Items that appear repeated inside a paged result.
pub trait PageItem: FromResult {
    /// Element name of one item.
    const TAG: &'static str;
}

fn required<'a>(operation: &str, el: &'a Element, name: &str) -> Result<&'a str> {
    el.child_text(name).ok_or_else(|| {
        Error::malformed(operation, format!("{} is missing {name}", el.name()))
    })
}

fn optional_number<T: FromStr>(operation: &str, el: &Element, name: &str) -> Result<Option<T>> {
    el.child_text(name)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                Error::malformed(operation, format!("{name} is not a number: {raw}"))
            })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Request status
// ---------------------------------------------------------------------------

/// One error entry from a `Request` or top-level `Errors` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub code: String,
    pub message: String,
}

impl ServiceError {
    /// Read every `<Error>` below `errors`.
    pub fn from_errors(errors: &Element) -> Vec<Self> {
        errors
            .all("Error")
            .map(|e| ServiceError {
                code: e.child_text("Code").unwrap_or_default().to_string(),
                message: e.child_text("Message").unwrap_or_default().to_string(),
            })
            .collect()
    }

    /// `code: message; code: message` for error displays.
    pub fn summary(errors: &[ServiceError]) -> String {
        if errors.is_empty() {
            return "no error detail".to_string();
        }
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// The `Request` block: whether the service accepted the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStatus {
    pub is_valid: bool,
    pub errors: Vec<ServiceError>,
}

impl FromResult for RequestStatus {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let request = el
            .first("Request")
            .ok_or_else(|| Error::malformed(operation, format!("{} has no Request", el.name())))?;
        let is_valid = match request.child_text("IsValid") {
            Some("True") => true,
            Some("False") => false,
            other => {
                return Err(Error::malformed(
                    operation,
                    format!("Request.IsValid must be True or False, got {other:?}"),
                ));
            }
        };
        let errors = request
            .first("Errors")
            .map(ServiceError::from_errors)
            .unwrap_or_default();
        Ok(Self { is_valid, errors })
    }
}

/// Result of an operation that only reports whether it was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub request: RequestStatus,
}

impl FromResult for Ack {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        Ok(Self {
            request: RequestStatus::from_result(operation, el)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// An amount of money. Serializes with wire names so it can be sent as a
/// `Reward` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Price {
    pub amount: BigDecimal,
    pub currency_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_price: Option<String>,
}

impl Price {
    pub fn usd(amount: BigDecimal) -> Self {
        Self {
            amount,
            currency_code: "USD".to_string(),
            formatted_price: None,
        }
    }

    fn decode(operation: &str, el: &Element) -> Result<Self> {
        let raw = required(operation, el, "Amount")?;
        let amount = raw
            .parse::<BigDecimal>()
            .map_err(|_| Error::malformed(operation, format!("bad amount: {raw}")))?;
        Ok(Self {
            amount,
            currency_code: required(operation, el, "CurrencyCode")?.to_string(),
            formatted_price: el.child_text("FormattedPrice").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub request: RequestStatus,
    pub available_balance: Price,
}

impl FromResult for AccountBalance {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let balance = el
            .first("AvailableBalance")
            .ok_or_else(|| Error::malformed(operation, "missing AvailableBalance"))?;
        Ok(Self {
            request: RequestStatus::from_result(operation, el)?,
            available_balance: Price::decode(operation, balance)?,
        })
    }
}

// ---------------------------------------------------------------------------
// HITs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitStatus {
    Assignable,
    Unassignable,
    Reviewable,
    Reviewing,
    Disposed,
    Other(String),
}

impl HitStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Assignable => "Assignable",
            Self::Unassignable => "Unassignable",
            Self::Reviewable => "Reviewable",
            Self::Reviewing => "Reviewing",
            Self::Disposed => "Disposed",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for HitStatus {
    fn from(s: &str) -> Self {
        match s {
            "Assignable" => Self::Assignable,
            "Unassignable" => Self::Unassignable,
            "Reviewable" => Self::Reviewable,
            "Reviewing" => Self::Reviewing,
            "Disposed" => Self::Disposed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A HIT as returned by CreateHIT, GetHIT and the HIT listings.
///
/// Listings do not always carry a `Request` block per item, so `request`
/// is only present where the service sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub request: Option<RequestStatus>,
    pub hit_id: String,
    pub hit_type_id: Option<String>,
    pub title: Option<String>,
    pub status: Option<HitStatus>,
    pub max_assignments: Option<u32>,
    pub expiration: Option<String>,
}

impl FromResult for Hit {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let request = match el.first("Request") {
            Some(_) => Some(RequestStatus::from_result(operation, el)?),
            None => None,
        };
        Ok(Self {
            request,
            hit_id: required(operation, el, "HITId")?.to_string(),
            hit_type_id: el.child_text("HITTypeId").map(str::to_string),
            title: el.child_text("Title").map(str::to_string),
            status: el.child_text("HITStatus").map(HitStatus::from),
            max_assignments: optional_number(operation, el, "MaxAssignments")?,
            expiration: el.child_text("Expiration").map(str::to_string),
        })
    }
}

impl PageItem for Hit {
    const TAG: &'static str = "HIT";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitTypeRegistration {
    pub request: RequestStatus,
    pub hit_type_id: String,
}

impl FromResult for HitTypeRegistration {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        Ok(Self {
            request: RequestStatus::from_result(operation, el)?,
            hit_type_id: required(operation, el, "HITTypeId")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub assignment_id: String,
    pub worker_id: Option<String>,
    pub hit_id: Option<String>,
    pub status: Option<String>,
}

impl FromResult for Assignment {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        Ok(Self {
            assignment_id: required(operation, el, "AssignmentId")?.to_string(),
            worker_id: el.child_text("WorkerId").map(str::to_string),
            hit_id: el.child_text("HITId").map(str::to_string),
            status: el.child_text("AssignmentStatus").map(str::to_string),
        })
    }
}

impl PageItem for Assignment {
    const TAG: &'static str = "Assignment";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusPayment {
    pub worker_id: String,
    pub assignment_id: Option<String>,
    pub amount: Option<Price>,
    pub reason: Option<String>,
}

impl FromResult for BonusPayment {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let amount = el
            .first("BonusAmount")
            .map(|price| Price::decode(operation, price))
            .transpose()?;
        Ok(Self {
            worker_id: required(operation, el, "WorkerId")?.to_string(),
            assignment_id: el.child_text("AssignmentId").map(str::to_string),
            amount,
            reason: el.child_text("Reason").map(str::to_string),
        })
    }
}

impl PageItem for BonusPayment {
    const TAG: &'static str = "BonusPayment";
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerBlock {
    pub worker_id: String,
    pub reason: Option<String>,
}

impl FromResult for WorkerBlock {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        Ok(Self {
            worker_id: required(operation, el, "WorkerId")?.to_string(),
            reason: el.child_text("Reason").map(str::to_string),
        })
    }
}

impl PageItem for WorkerBlock {
    const TAG: &'static str = "WorkerBlock";
}

// ---------------------------------------------------------------------------
// Qualifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualificationTypeStatus {
    Active,
    Inactive,
}

impl QualificationTypeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl FromStr for QualificationTypeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            other => Err(Error::Other(format!(
                "unknown qualification type status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationType {
    pub request: Option<RequestStatus>,
    pub qualification_type_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<QualificationTypeStatus>,
}

impl FromResult for QualificationType {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let request = match el.first("Request") {
            Some(_) => Some(RequestStatus::from_result(operation, el)?),
            None => None,
        };
        let status = el
            .child_text("QualificationTypeStatus")
            .map(str::parse::<QualificationTypeStatus>)
            .transpose()
            .map_err(|e: Error| Error::malformed(operation, e.to_string()))?;
        Ok(Self {
            request,
            qualification_type_id: required(operation, el, "QualificationTypeId")?.to_string(),
            name: el.child_text("Name").map(str::to_string),
            description: el.child_text("Description").map(str::to_string),
            status,
        })
    }
}

impl PageItem for QualificationType {
    const TAG: &'static str = "QualificationType";
}

/// A worker's score for one qualification type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualification {
    pub request: Option<RequestStatus>,
    pub qualification_type_id: String,
    pub subject_id: String,
    pub integer_value: Option<i64>,
    pub status: Option<String>,
}

impl FromResult for Qualification {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let request = match el.first("Request") {
            Some(_) => Some(RequestStatus::from_result(operation, el)?),
            None => None,
        };
        Ok(Self {
            request,
            qualification_type_id: required(operation, el, "QualificationTypeId")?.to_string(),
            subject_id: required(operation, el, "SubjectId")?.to_string(),
            integer_value: optional_number(operation, el, "IntegerValue")?,
            status: el.child_text("Status").map(str::to_string),
        })
    }
}

impl PageItem for Qualification {
    const TAG: &'static str = "Qualification";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualificationRequest {
    pub qualification_request_id: String,
    pub qualification_type_id: Option<String>,
    pub subject_id: Option<String>,
}

impl FromResult for QualificationRequest {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        Ok(Self {
            qualification_request_id: required(operation, el, "QualificationRequestId")?
                .to_string(),
            qualification_type_id: el.child_text("QualificationTypeId").map(str::to_string),
            subject_id: el.child_text("SubjectId").map(str::to_string),
        })
    }
}

impl PageItem for QualificationRequest {
    const TAG: &'static str = "QualificationRequest";
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPoint {
    pub date: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterStatistic {
    pub request: RequestStatus,
    pub statistic: Option<String>,
    pub time_period: Option<String>,
    pub data_points: Vec<DataPoint>,
}

impl FromResult for RequesterStatistic {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let data_points = el
            .all("DataPoint")
            .map(|point| DataPoint {
                date: point.child_text("Date").map(str::to_string),
                value: point
                    .child_text("LongValue")
                    .or_else(|| point.child_text("DoubleValue"))
                    .map(str::to_string),
            })
            .collect();
        Ok(Self {
            request: RequestStatus::from_result(operation, el)?,
            statistic: el.child_text("Statistic").map(str::to_string),
            time_period: el.child_text("TimePeriod").map(str::to_string),
            data_points,
        })
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// One page of a listing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub request: RequestStatus,
    pub num_results: Option<u32>,
    pub total_num_results: Option<u32>,
    pub page_number: Option<u32>,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }
}

impl<T: PageItem> FromResult for Page<T> {
    fn from_result(operation: &str, el: &Element) -> Result<Self> {
        let items = el
            .all(T::TAG)
            .map(|item| T::from_result(operation, item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            request: RequestStatus::from_result(operation, el)?,
            num_results: optional_number(operation, el, "NumResults")?,
            total_num_results: optional_number(operation, el, "TotalNumResults")?,
            page_number: optional_number(operation, el, "PageNumber")?,
            items,
        })
    }
}
