//! Scenario outcomes and the per-run report.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use opentelemetry::KeyValue;
use tracing::{Instrument, warn};

use super::{Group, ScenarioError, ScenarioResult};
use crate::telemetry::{metrics, scenario};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed(_) => "failed",
            Outcome::Skipped(_) => "skipped",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed(reason) | Outcome::Skipped(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub group: Group,
    pub name: String,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<13} {:<55} {:<8} {:>7.0?}",
            self.group.as_str(),
            self.name,
            self.outcome.as_str(),
            self.elapsed
        )?;
        if let Some(reason) = self.outcome.reason() {
            write!(f, "  {reason}")?;
        }
        Ok(())
    }
}

/// Results of a run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    scenarios: Vec<ScenarioReport>,
}

impl Report {
    pub fn scenarios(&self) -> &[ScenarioReport] {
        &self.scenarios
    }

    pub fn outcome(&self, group: Group, name: &str) -> Option<&Outcome> {
        self.scenarios
            .iter()
            .find(|s| s.group == group && s.name == name)
            .map(|s| &s.outcome)
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    /// No scenario failed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.scenarios.iter().filter(|s| pred(&s.outcome)).count()
    }

    /// Run one scenario under its group's time budget and record it.
    /// Returns the scenario's value when it passed.
    pub async fn run<T, F>(&mut self, group: Group, name: &str, body: F) -> Option<T>
    where
        F: Future<Output = ScenarioResult<T>>,
    {
        let budget = group.timeout();
        let span = scenario::start_scenario_span(group.as_str(), name);
        let started = Instant::now();
        let result = match tokio::time::timeout(budget, body.instrument(span.clone())).await {
            Ok(result) => result,
            Err(_) => Err(ScenarioError::Timeout(budget)),
        };
        let elapsed = started.elapsed();

        match result {
            Ok(value) => {
                self.record(group, name, Outcome::Passed, elapsed, &span);
                Some(value)
            }
            Err(e) => {
                self.record(group, name, Outcome::Failed(e.to_string()), elapsed, &span);
                None
            }
        }
    }

    /// Run a group's setup under the group's budget. On failure every
    /// scenario of the group is recorded as failed with the setup error.
    pub async fn setup<T, F>(&mut self, group: Group, setup: F) -> Option<T>
    where
        F: Future<Output = ScenarioResult<T>>,
    {
        let budget = group.timeout();
        let result = match tokio::time::timeout(budget, setup).await {
            Ok(result) => result,
            Err(_) => Err(ScenarioError::Timeout(budget)),
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(group = group.as_str(), error = %e, "group setup failed");
                let reason = format!("setup failed: {e}");
                for name in group.scenarios() {
                    self.fail(group, name, reason.clone());
                }
                None
            }
        }
    }

    pub fn skip(&mut self, group: Group, name: &str, reason: impl Into<String>) {
        let span = scenario::start_scenario_span(group.as_str(), name);
        self.record(group, name, Outcome::Skipped(reason.into()), Duration::ZERO, &span);
    }

    pub fn fail(&mut self, group: Group, name: &str, reason: impl Into<String>) {
        let span = scenario::start_scenario_span(group.as_str(), name);
        self.record(group, name, Outcome::Failed(reason.into()), Duration::ZERO, &span);
    }

    fn record(
        &mut self,
        group: Group,
        name: &str,
        outcome: Outcome,
        elapsed: Duration,
        span: &tracing::Span,
    ) {
        scenario::record_outcome(span, outcome.as_str(), outcome.reason(), elapsed);
        metrics::scenarios().add(
            1,
            &[
                KeyValue::new("group", group.as_str()),
                KeyValue::new("outcome", outcome.as_str()),
            ],
        );
        self.scenarios.push(ScenarioReport {
            group,
            name: name.to_string(),
            outcome,
            elapsed,
        });
    }
}
