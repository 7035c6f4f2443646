//! Trace lines for a falsifying program.
//!
//! ```text
//! t1 = 0.119
//! t2 = t1 / t1
//! t3 = 0.162
//! t4 = 0.632
//! assert associative_add(t4, t3, t2)
//! ```
//!
//! Arguments read from the top of the stack, so the most recent value comes
//! first.
//!
//! Rearrangement steps keep their variables and are left out.

use testmachine_core::{Binding, ExecutedStep, FailureKind, StepKind};

/// One line per executed step, rearrangements omitted.
pub fn trace_lines(trace: &[ExecutedStep]) -> Vec<String> {
    trace.iter().filter_map(step_line).collect()
}

/// Render a single executed step, `None` for rearrangements.
pub fn step_line(step: &ExecutedStep) -> Option<String> {
    match step.kind {
        StepKind::Rearrange => None,
        StepKind::Generate => Some(match step.outputs.first() {
            Some(binding) => format!("{} = {}", binding.var, binding.value),
            None => format!("{}()", step.operation),
        }),
        StepKind::Compute => {
            let call = expression(step);
            if step.outputs.is_empty() {
                Some(call)
            } else {
                Some(format!("{} = {}", vars(&step.outputs), call))
            }
        }
        StepKind::Check => Some(format!("assert {}({})", step.operation, vars(&step.inputs))),
    }
}

/// Closing line naming what went wrong and the values involved.
pub fn failure_line(kind: &FailureKind) -> String {
    match kind {
        FailureKind::CheckFailed { check, observed } => {
            format!("check `{}` failed on {}", check, assignments(observed))
        }
        FailureKind::OperationError {
            operation,
            message,
            observed,
        } if observed.is_empty() => format!("operation `{}` raised: {}", operation, message),
        FailureKind::OperationError {
            operation,
            message,
            observed,
        } => format!(
            "operation `{}` raised: {} (inputs {})",
            operation,
            message,
            assignments(observed)
        ),
    }
}

/// `{0} + {1}` style notation with positional inputs substituted, or a
/// plain call `name(t2, t1)`.
fn expression(step: &ExecutedStep) -> String {
    match &step.notation {
        Some(notation) => step
            .inputs
            .iter()
            .enumerate()
            .fold(notation.clone(), |text, (i, binding)| {
                text.replace(&format!("{{{}}}", i), &binding.var.to_string())
            }),
        None => format!("{}({})", step.operation, vars(&step.inputs)),
    }
}

fn vars(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(|b| b.var.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn assignments(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(|b| format!("{} = {}", b.var, b.value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use testmachine_core::{Value, Var};

    fn bind(n: u32, value: f64) -> Binding {
        Binding {
            var: Var(n),
            value: Value::Float(value),
        }
    }

    fn step(kind: StepKind, operation: &str, inputs: Vec<Binding>, outputs: Vec<Binding>) -> ExecutedStep {
        ExecutedStep {
            index: 0,
            operation: operation.to_string(),
            kind,
            notation: None,
            inputs,
            outputs,
            passed: None,
        }
    }

    #[test]
    fn test_generator_line() {
        let line = step_line(&step(StepKind::Generate, "generate_floats", vec![], vec![bind(1, 0.5)]));
        assert_eq!(line.as_deref(), Some("t1 = 0.5"));
    }

    #[test]
    fn test_compute_with_notation() {
        let mut sub = step(
            StepKind::Compute,
            "sub_floats",
            vec![bind(2, 0.5), bind(1, 0.25)],
            vec![bind(3, 0.25)],
        );
        sub.notation = Some("{0} - {1}".to_string());
        assert_eq!(step_line(&sub).as_deref(), Some("t3 = t2 - t1"));

        sub.notation = None;
        assert_eq!(step_line(&sub).as_deref(), Some("t3 = sub_floats(t2, t1)"));
    }

    #[test]
    fn test_rearrange_is_omitted() {
        let swap = step(
            StepKind::Rearrange,
            "swap_floats",
            vec![bind(1, 0.5), bind(2, 0.25)],
            vec![bind(2, 0.25), bind(1, 0.5)],
        );
        assert_eq!(step_line(&swap), None);
        assert!(trace_lines(&[swap]).is_empty());
    }

    #[test]
    fn test_check_and_failure_lines() {
        let observed = vec![bind(3, 0.3), bind(2, 0.2), bind(1, 0.1)];
        let check = step(StepKind::Check, "associative_add", observed.clone(), vec![]);
        assert_eq!(step_line(&check).as_deref(), Some("assert associative_add(t3, t2, t1)"));

        let kind = FailureKind::CheckFailed {
            check: "associative_add".to_string(),
            observed,
        };
        assert_eq!(
            failure_line(&kind),
            "check `associative_add` failed on t3 = 0.3, t2 = 0.2, t1 = 0.1"
        );
    }

    #[test]
    fn test_operation_error_line() {
        let kind = FailureKind::OperationError {
            operation: "generate_floats".to_string(),
            message: "panicked: boom".to_string(),
            observed: vec![],
        };
        assert_eq!(failure_line(&kind), "operation `generate_floats` raised: panicked: boom");
    }
}
