//! Typed request parameters for the operations that take structured input.
//!
//! Field names serialize to the wire names (`HITTypeId`, `Reward`, ...), so
//! these go straight through [`Params::from_serialize`](super::params::Params::from_serialize).

use serde::{Deserialize, Serialize};

use super::params::Params;
use super::response::{Price, QualificationTypeStatus};

/// The reusable part of a HIT: what `RegisterHITType` takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HitTypeParams {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub assignment_duration_in_seconds: u64,
    pub auto_approval_delay_in_seconds: u64,
    pub reward: Price,
}

/// A full HIT definition for `CreateHIT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HitParams {
    #[serde(flatten)]
    pub hit_type: HitTypeParams,
    pub question: String,
    pub max_assignments: u32,
    pub lifetime_in_seconds: u64,
}

impl HitParams {
    /// The HIT-type subset, for registering a type with the same settings.
    pub fn hit_type(&self) -> HitTypeParams {
        self.hit_type.clone()
    }
}

/// `CreateHIT` against an already registered HIT type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HitFromType {
    #[serde(rename = "HITTypeId")]
    pub hit_type_id: String,
    pub question: String,
    pub lifetime_in_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_assignments: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewQualificationType {
    pub name: String,
    pub description: String,
    pub qualification_type_status: QualificationTypeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationTransport {
    Email,
    #[serde(rename = "SQS")]
    Sqs,
}

/// A notification subscription for `SetHITTypeNotification` and
/// `SendTestEventNotification`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Notification {
    pub destination: String,
    pub transport: NotificationTransport,
    pub version: String,
    pub event_type: Vec<String>,
}

impl Notification {
    /// Notification API version the service accepts.
    pub const VERSION: &'static str = "2006-05-05";

    pub fn email(destination: impl Into<String>, event_types: &[&str]) -> Self {
        Self {
            destination: destination.into(),
            transport: NotificationTransport::Email,
            version: Self::VERSION.to_string(),
            event_type: event_types.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Paging for the listing operations. Unset fields use the service defaults
/// (page size 10, first page).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
}

impl PageRequest {
    pub fn size(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            page_number: None,
        }
    }

    pub fn page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Add `PageSize` / `PageNumber` to `params`.
    pub fn apply(self, params: Params) -> Params {
        let params = match self.page_size {
            Some(size) => params.with("PageSize", size),
            None => params,
        };
        match self.page_number {
            Some(number) => params.with("PageNumber", number),
            None => params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn sample() -> HitParams {
        HitParams {
            hit_type: HitTypeParams {
                title: "EXAMPLE".into(),
                description: "desc".into(),
                keywords: "test, HIT".into(),
                assignment_duration_in_seconds: 180,
                auto_approval_delay_in_seconds: 0,
                reward: Price::usd(BigDecimal::from_str("0.01").unwrap()),
            },
            question: "&lt;q&gt;".into(),
            max_assignments: 1,
            lifetime_in_seconds: 259_200,
        }
    }

    #[test]
    fn hit_params_flatten_to_wire_names() {
        let flat = Params::from_serialize(&sample()).unwrap().flatten();
        let get = |k: &str| {
            flat.iter()
                .find(|(name, _)| name == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("Title"), Some("EXAMPLE"));
        assert_eq!(get("AssignmentDurationInSeconds"), Some("180"));
        assert_eq!(get("LifetimeInSeconds"), Some("259200"));
        assert_eq!(get("Reward.1.Amount"), Some("0.01"));
        assert_eq!(get("Reward.1.CurrencyCode"), Some("USD"));
        assert_eq!(get("Reward.1.FormattedPrice"), None);
    }

    #[test]
    fn hit_from_type_uses_upper_case_id() {
        let params = Params::from_serialize(&HitFromType {
            hit_type_id: "T1".into(),
            question: "q".into(),
            lifetime_in_seconds: 3600,
            max_assignments: None,
        })
        .unwrap();
        assert_eq!(params.get_str("HITTypeId").as_deref(), Some("T1"));
        assert!(params.get("MaxAssignments").is_none());
    }

    #[test]
    fn notification_transport_names() {
        let n = Notification::email("janedoe@example.com", &["AssignmentSubmitted"]);
        let flat = Params::new()
            .with("Notification", serde_json::to_value(vec![n]).unwrap())
            .flatten();
        assert!(flat.contains(&("Notification.1.Transport".into(), "Email".into())));
        assert!(flat.contains(&(
            "Notification.1.EventType.1".into(),
            "AssignmentSubmitted".into()
        )));
    }

    #[test]
    fn paging_only_sends_what_was_set() {
        let params = PageRequest::size(100).page(3).apply(Params::new());
        assert_eq!(params.get_str("PageSize").as_deref(), Some("100"));
        assert_eq!(params.get_str("PageNumber").as_deref(), Some("3"));
        assert!(PageRequest::default().apply(Params::new()).is_empty());
    }
}
