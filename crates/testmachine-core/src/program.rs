//! Program: the synthesized step sequence of one trial.
use serde::{Deserialize, Serialize};

use crate::catalog::OperationId;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Catalog position of the operation
    pub operation: OperationId,
    /// Operation name, kept for reports
    pub name: String,
    /// Value drawn at synthesis time (generators only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawn: Option<Value>,
}

impl Step {
    pub fn invoke(operation: OperationId, name: impl Into<String>) -> Self {
        Self {
            operation,
            name: name.into(),
            drawn: None,
        }
    }

    pub fn generated(operation: OperationId, name: impl Into<String>, value: Value) -> Self {
        Self {
            operation,
            name: name.into(),
            drawn: Some(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    steps: Vec<Step>,
}

impl Program {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The first `len` steps.
    pub fn truncated(&self, len: usize) -> Program {
        Program {
            steps: self.steps.iter().take(len).cloned().collect(),
        }
    }

    /// Content hash, stable across runs for identical programs.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(&self.steps).unwrap_or_default();
        format!("blake3:{}", blake3::hash(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        Program::new(vec![
            Step::generated(OperationId(0), "random", Value::Float(0.25)),
            Step::generated(OperationId(0), "random", Value::Float(0.5)),
            Step::invoke(OperationId(3), "add"),
        ])
    }

    #[test]
    fn test_truncate() {
        let program = sample();
        let head = program.truncated(2);
        assert_eq!(head.len(), 2);
        assert_eq!(head.steps()[1].drawn, Some(Value::Float(0.5)));
        assert_eq!(program.truncated(10), program);
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = sample();
        let b = sample();
        assert_eq!(a.digest(), b.digest());
        assert!(a.digest().starts_with("blake3:"));
        assert_ne!(a.digest(), a.truncated(2).digest());
    }
}
