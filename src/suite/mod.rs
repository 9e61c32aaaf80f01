//! Conformance suite for the requester client.
//!
//! Scenarios are grouped the way they depend on each other. Each group owns
//! the identifiers its fixture creates; nothing is shared across groups.
//! Every scenario runs under a timeout and ends up in the [`Report`] as
//! passed, failed or skipped.

mod fixtures;
mod report;
mod scenarios;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub use fixtures::{
    ExpiredHitFixture, HitAndTypeFixture, HitFixture, HitTypeFixture, QualificationFixture,
};
pub use report::{Outcome, Report, ScenarioReport};
pub use scenarios::{THROTTLING_PAGES, legacy_probe, throttling_probe};

use crate::client::Client;
use crate::error::Error;
use crate::fixture::DEFAULT_TEMPLATE;

/// Worker every worker-facing scenario targets.
pub const WORKER_ID: &str = "A2Q1RSC9MWUTL2";

/// Name of the qualification type created by the qualification group.
pub const QUALIFICATION_NAME: &str = "SANDBOX_QUALIFICATION_6";

/// Why `SendTestEventNotification` is never run.
pub const NOTIFICATION_SKIP_REASON: &str = "Notification services require setup (on your end)";

pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(10);
pub const THROTTLING_TIMEOUT: Duration = Duration::from_secs(30);
pub const LEGACY_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Client(#[from] Error),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub type ScenarioResult<T = ()> = std::result::Result<T, ScenarioError>;

/// Fail the scenario with `message` unless `condition` holds.
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> ScenarioResult {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(message()))
    }
}

/// Scenario groups, in the order the suite runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Standalone,
    Qualification,
    Hits,
    ExpiredHit,
    HitType,
    HitAndType,
    Notification,
    Throttling,
    Legacy,
}

impl Group {
    pub const ALL: &'static [Group] = &[
        Group::Standalone,
        Group::Qualification,
        Group::Hits,
        Group::ExpiredHit,
        Group::HitType,
        Group::HitAndType,
        Group::Notification,
        Group::Throttling,
        Group::Legacy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Group::Standalone => "standalone",
            Group::Qualification => "qualification",
            Group::Hits => "hits",
            Group::ExpiredHit => "expired-hit",
            Group::HitType => "hit-type",
            Group::HitAndType => "hit-and-type",
            Group::Notification => "notification",
            Group::Throttling => "throttling",
            Group::Legacy => "legacy",
        }
    }

    /// Scenario names of the group, in run order.
    pub fn scenarios(self) -> &'static [&'static str] {
        match self {
            Group::Standalone => &[
                "CreateHIT",
                "RegisterHITType",
                "BlockWorker",
                "GetBlockedWorkers",
                "UnblockWorker",
                "GetAccountBalance",
                "GetQualificationRequests",
                "GetRequesterStatistic",
                "GetRequesterWorkerStatistic",
                "GetReviewableHITs",
                "NotifyWorkers",
            ],
            Group::Qualification => &[
                "CreateQualificationType",
                "SearchQualificationTypes - MustBeRequestable = true",
                "SearchQualificationTypes - MustBeRequestable = false",
                "GetHITsForQualificationType",
                "GetQualificationsForQualificationType",
                "AssignQualification",
                "GetQualificationScore",
                "GetQualificationType",
                "UpdateQualificationType",
                "UpdateQualificationScore",
                "RevokeQualification",
                "DisposeQualificationType",
            ],
            Group::Hits => &[
                "SearchHITs",
                "GetHIT",
                "GetBonusPayments",
                "GetAssignmentsForHIT",
                "ExtendHIT",
                "GetReviewResultsForHIT",
                "ForceExpireHIT",
                "DisableHIT",
            ],
            Group::ExpiredHit => &["SetHITAsReviewing", "DisposeHIT"],
            Group::HitType => &["CreateHIT with HITTypeId", "SetHITTypeNotification"],
            Group::HitAndType => &["ChangeHITTypeOfHIT"],
            Group::Notification => &["SendTestEventNotification"],
            Group::Throttling => &["Multiple simultaneous requests"],
            Group::Legacy => &["v1.0 Compatibility"],
        }
    }

    /// Time budget of each scenario in the group.
    pub fn timeout(self) -> Duration {
        match self {
            Group::Throttling => THROTTLING_TIMEOUT,
            Group::Legacy => LEGACY_TIMEOUT,
            _ => SCENARIO_TIMEOUT,
        }
    }
}

impl FromStr for Group {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Group::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Group::ALL.iter().map(|g| g.as_str()).collect();
                Error::Config(format!("unknown group `{s}`, expected one of {}", known.join(", ")))
            })
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a scenario needs: the client, the question template and the
/// worker to target.
#[derive(Debug, Clone)]
pub struct Context {
    pub client: Client,
    /// Client built with the legacy constructor, for the compatibility probe.
    pub legacy: Client,
    pub template: PathBuf,
    pub worker_id: String,
    /// Whether the account balance must equal the sandbox's fixed balance.
    pub expect_sandbox_balance: bool,
}

/// A configured suite run.
#[derive(Debug, Clone)]
pub struct Suite {
    context: Context,
    groups: Vec<Group>,
}

impl Suite {
    /// Suite over `client` running every group with the shipped template.
    ///
    /// `legacy` is the client built with the deprecated constructor; the
    /// compatibility group compares its answers with those of `client`.
    pub fn new(client: Client, legacy: Client) -> Self {
        Self {
            context: Context {
                client,
                legacy,
                template: PathBuf::from(DEFAULT_TEMPLATE),
                worker_id: WORKER_ID.to_string(),
                expect_sandbox_balance: true,
            },
            groups: Group::ALL.to_vec(),
        }
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.context.template = template.into();
        self
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.context.worker_id = worker_id.into();
        self
    }

    /// Only check the balance amount on the sandbox.
    pub fn with_sandbox_balance(mut self, expect: bool) -> Self {
        self.context.expect_sandbox_balance = expect;
        self
    }

    /// Restrict the run to `groups`; run order stays the declaration order.
    pub fn with_groups(mut self, groups: &[Group]) -> Self {
        self.groups = Group::ALL
            .iter()
            .copied()
            .filter(|g| groups.contains(g))
            .collect();
        self
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Run the selected groups one after another.
    pub async fn run(&self) -> Report {
        let mut report = Report::default();
        for group in &self.groups {
            tracing::info!(group = group.as_str(), "running group");
            scenarios::run_group(*group, &self.context, &mut report).await;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_names_round_trip() {
        for group in Group::ALL {
            assert_eq!(group.as_str().parse::<Group>().unwrap(), *group);
        }
        assert!("everything".parse::<Group>().is_err());
    }

    #[test]
    fn selection_keeps_declaration_order() {
        let fake = std::sync::Arc::new(crate::transport::fake::FakeMTurk::new());
        let client = Client::with_transport(fake.clone());
        let suite = Suite::new(client, Client::with_transport(fake))
            .with_groups(&[Group::Legacy, Group::Standalone]);
        assert_eq!(suite.groups(), &[Group::Standalone, Group::Legacy]);
    }

    #[test]
    fn long_running_groups_get_longer_budgets() {
        assert_eq!(Group::Throttling.timeout(), Duration::from_secs(30));
        assert_eq!(Group::Legacy.timeout(), Duration::from_secs(20));
        assert_eq!(Group::Hits.timeout(), Duration::from_secs(10));
    }
}
