//! Trial outcomes and run results.
//!
//! A trial ends as Pass, Skipped or Fail. A failure is either a property
//! violation (a check returned false) or a crash (an operation raised).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::program::Program;
use crate::stack::Binding;

/// Why a trial failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureKind {
    /// A check evaluated to false
    CheckFailed {
        check: String,
        observed: Vec<Binding>,
    },
    /// A generator, transform or predicate raised an error
    OperationError {
        operation: String,
        message: String,
        observed: Vec<Binding>,
    },
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::CheckFailed { .. } => "check failure",
            FailureKind::OperationError { .. } => "operation error",
        }
    }

    /// Name of the check or operation at fault.
    pub fn culprit(&self) -> &str {
        match self {
            FailureKind::CheckFailed { check, .. } => check,
            FailureKind::OperationError { operation, .. } => operation,
        }
    }

    pub fn observed(&self) -> &[Binding] {
        match self {
            FailureKind::CheckFailed { observed, .. } => observed,
            FailureKind::OperationError { observed, .. } => observed,
        }
    }

    pub fn is_check_failure(&self) -> bool {
        matches!(self, FailureKind::CheckFailed { .. })
    }
}

/// A falsifying program with everything needed to explain and replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// Zero-based trial index within the run
    pub trial: u64,
    /// Seed of this trial's RNG; replays the program in isolation
    pub trial_seed: u64,
    /// The program, truncated after the failing step
    pub program: Program,
    /// Executed steps, the failing one last
    pub trace: Vec<crate::executor::ExecutedStep>,
    pub kind: FailureKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Pass,
    Fail(Box<Failure>),
    Skipped(String),
}

impl TrialOutcome {
    pub fn is_fail(&self) -> bool {
        matches!(self, TrialOutcome::Fail(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Found,
    Exhausted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Found => write!(f, "FOUND"),
            RunStatus::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

/// Per-run tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStats {
    pub passed: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: String,
    pub status: RunStatus,
    /// Trials consumed, the failing one included
    pub trials: u64,
    /// Seed the run was derived from
    pub seed: u64,
    pub stats: TrialStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Text produced by the reporter, when one was attached and succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl RunResult {
    pub fn found(&self) -> bool {
        self.status == RunStatus::Found
    }

    pub fn summary(&self) -> String {
        match &self.failure {
            Some(failure) => format!(
                "[{}] seed={} trials={} {} in `{}` at trial {}",
                self.status,
                self.seed,
                self.trials,
                failure.kind.label(),
                failure.kind.culprit(),
                failure.trial
            ),
            None => format!(
                "[{}] seed={} trials={} no counterexample found within budget",
                self.status, self.seed, self.trials
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Var;
    use crate::value::Value;

    #[test]
    fn test_failure_kind_accessors() {
        let kind = FailureKind::CheckFailed {
            check: "associative_add".to_string(),
            observed: vec![Binding {
                var: Var(1),
                value: Value::Float(0.1),
            }],
        };
        assert_eq!(kind.label(), "check failure");
        assert_eq!(kind.culprit(), "associative_add");
        assert_eq!(kind.observed().len(), 1);
        assert!(kind.is_check_failure());

        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "check_failed");
    }

    #[test]
    fn test_exhausted_summary() {
        let result = RunResult {
            run_id: "run".to_string(),
            status: RunStatus::Exhausted,
            trials: 10,
            seed: 0,
            stats: TrialStats {
                passed: 0,
                skipped: 10,
                failed: 0,
            },
            failure: None,
            report: None,
            started_at: Utc::now(),
            elapsed_ms: 0,
        };
        assert!(!result.found());
        assert!(result.summary().contains("no counterexample found"));
        assert!(result.summary().starts_with("[EXHAUSTED]"));
    }
}
