//! Executor: replays a program against a fresh stack machine.
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::OperationCatalog;
use crate::error::OperationError;
use crate::operation::{Effect, Operation};
use crate::outcome::FailureKind;
use crate::program::{Program, Step};
use crate::stack::{Binding, StackMachine};
use crate::tag::TypeTag;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Generate,
    Compute,
    Rearrange,
    Check,
}

/// One step as it actually ran, with the values it saw and produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedStep {
    pub index: usize,
    pub operation: String,
    pub kind: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
    pub inputs: Vec<Binding>,
    pub outputs: Vec<Binding>,
    /// Check result; `None` for non-checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionStatus {
    /// Every step ran and every check passed
    Completed,
    /// Step `at` failed a check or raised
    Falsified { at: usize, kind: FailureKind },
    /// The program could not run (stack underflow, foreign step)
    Aborted { at: usize, reason: String },
}

#[derive(Debug, Clone)]
pub struct Execution {
    pub trace: Vec<ExecutedStep>,
    pub status: ExecutionStatus,
}

pub struct Executor<'a> {
    catalog: &'a OperationCatalog,
}

impl<'a> Executor<'a> {
    pub fn new(catalog: &'a OperationCatalog) -> Self {
        Self { catalog }
    }

    /// Run `program` from empty stacks, halting at the first failure.
    pub fn execute(&self, program: &Program) -> Execution {
        let mut machine = StackMachine::new();
        let mut trace = Vec::with_capacity(program.len());

        for (index, step) in program.steps().iter().enumerate() {
            let Some(operation) = self.catalog.get(step.operation) else {
                return Execution {
                    trace,
                    status: ExecutionStatus::Aborted {
                        at: index,
                        reason: format!("step {} names unknown operation `{}`", index, step.name),
                    },
                };
            };

            match self.run_step(&mut machine, index, step, operation) {
                Ok(executed) => {
                    trace!(step = index, operation = %executed.operation, "executed");
                    trace.push(executed);
                }
                Err(StepError::Falsified(executed, kind)) => {
                    trace.push(executed);
                    return Execution {
                        trace,
                        status: ExecutionStatus::Falsified { at: index, kind },
                    };
                }
                Err(StepError::Aborted(reason)) => {
                    return Execution {
                        trace,
                        status: ExecutionStatus::Aborted { at: index, reason },
                    };
                }
            }
        }

        Execution {
            trace,
            status: ExecutionStatus::Completed,
        }
    }

    fn run_step(
        &self,
        machine: &mut StackMachine,
        index: usize,
        step: &Step,
        operation: &Operation,
    ) -> Result<ExecutedStep, StepError> {
        match operation {
            Operation::Generator(generator) => {
                let Some(value) = step.drawn.clone() else {
                    return Err(StepError::Aborted(format!(
                        "generator step {} carries no drawn value",
                        index
                    )));
                };
                let mut executed = ExecutedStep {
                    index,
                    operation: generator.name().to_string(),
                    kind: StepKind::Generate,
                    notation: None,
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                    passed: None,
                };
                let declared = std::slice::from_ref(generator.output());
                if let Err(error) = check_kinds(generator.name(), declared, std::slice::from_ref(&value)) {
                    return Err(StepError::operation(executed, error, Vec::new()));
                }
                let binding = Binding {
                    var: machine.fresh_var(),
                    value,
                };
                machine.push(generator.output(), binding.clone());
                executed.outputs.push(binding);
                Ok(executed)
            }

            Operation::Transform(transform) => {
                let args = machine
                    .take_args(transform.inputs(), true)
                    .map_err(|e| StepError::Aborted(e.to_string()))?;
                let is_rearrange = matches!(transform.effect(), Effect::Rearrange(_));
                let mut executed = ExecutedStep {
                    index,
                    operation: transform.name().to_string(),
                    kind: if is_rearrange { StepKind::Rearrange } else { StepKind::Compute },
                    notation: transform.notation().map(str::to_string),
                    inputs: args.clone(),
                    outputs: Vec::new(),
                    passed: None,
                };

                let outputs: Vec<Binding> = match transform.effect() {
                    Effect::Rearrange(indices) => indices.iter().map(|&i| args[i].clone()).collect(),
                    Effect::Compute(_) => {
                        let values: Vec<Value> = args.iter().map(|b| b.value.clone()).collect();
                        let produced = match transform.apply(&values) {
                            Ok(produced) => produced,
                            Err(error) => return Err(StepError::operation(executed, error, args)),
                        };
                        if let Err(error) = check_kinds(transform.name(), transform.outputs(), &produced) {
                            return Err(StepError::operation(executed, error, args));
                        }
                        produced
                            .into_iter()
                            .map(|value| Binding {
                                var: machine.fresh_var(),
                                value,
                            })
                            .collect()
                    }
                };

                // outputs are listed top first
                for (tag, binding) in transform.outputs().iter().zip(&outputs).rev() {
                    machine.push(tag, binding.clone());
                }
                executed.outputs = outputs;
                Ok(executed)
            }

            Operation::Check(check) => {
                let args = machine
                    .take_args(check.inputs(), false)
                    .map_err(|e| StepError::Aborted(e.to_string()))?;
                let values: Vec<Value> = args.iter().map(|b| b.value.clone()).collect();
                let mut executed = ExecutedStep {
                    index,
                    operation: check.name().to_string(),
                    kind: StepKind::Check,
                    notation: None,
                    inputs: args.clone(),
                    outputs: Vec::new(),
                    passed: None,
                };

                match check.evaluate(&values) {
                    Ok(true) => {
                        executed.passed = Some(true);
                        Ok(executed)
                    }
                    Ok(false) => {
                        executed.passed = Some(false);
                        let kind = FailureKind::CheckFailed {
                            check: check.name().to_string(),
                            observed: args,
                        };
                        Err(StepError::Falsified(executed, kind))
                    }
                    Err(error) => Err(StepError::operation(executed, error, args)),
                }
            }
        }
    }
}

enum StepError {
    Falsified(ExecutedStep, FailureKind),
    Aborted(String),
}

impl StepError {
    fn operation(executed: ExecutedStep, error: OperationError, observed: Vec<Binding>) -> Self {
        StepError::Falsified(
            executed,
            FailureKind::OperationError {
                operation: error.operation,
                message: error.message,
                observed,
            },
        )
    }
}

/// Produced values must match the declared output tags in count and kind.
fn check_kinds(name: &str, tags: &[TypeTag], values: &[Value]) -> Result<(), OperationError> {
    if tags.len() != values.len() {
        return Err(OperationError::new(
            name,
            format!("declared {} output(s) but produced {}", tags.len(), values.len()),
        ));
    }
    for (tag, value) in tags.iter().zip(values) {
        if tag.kind() != value.kind() {
            return Err(OperationError::new(
                name,
                format!(
                    "type mismatch on `{}`: expected {}, got {}",
                    tag,
                    tag.kind(),
                    value.kind()
                ),
            ));
        }
    }
    Ok(())
}
