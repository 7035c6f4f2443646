//! Operations: the closed set of things a program step can do.
//!
//! Every operation declares its input and output tags up front. Arity never
//! changes after construction, which is what lets the synthesizer reason about
//! stack depths without running anything.
//!
//! - [`Generator`]: no inputs, draws one fresh value for its tag.
//! - [`Transform`]: pops its inputs and pushes its outputs.
//! - [`Check`]: peeks its inputs and evaluates a predicate.

use rand::RngCore;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{ConfigurationError, OperationError};
use crate::tag::TypeTag;
use crate::value::Value;

pub type DrawFn = Arc<dyn Fn(&mut dyn RngCore) -> Value + Send + Sync>;
pub type ComputeFn = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>, String> + Send + Sync>;
pub type PredicateFn = Arc<dyn Fn(&[Value]) -> Result<bool, String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Generator,
    Transform,
    Check,
}

#[derive(Clone)]
pub enum Operation {
    Generator(Generator),
    Transform(Transform),
    Check(Check),
}

impl Operation {
    pub fn name(&self) -> &str {
        match self {
            Operation::Generator(g) => &g.name,
            Operation::Transform(t) => &t.name,
            Operation::Check(c) => &c.name,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Generator(_) => OperationKind::Generator,
            Operation::Transform(_) => OperationKind::Transform,
            Operation::Check(_) => OperationKind::Check,
        }
    }

    pub fn inputs(&self) -> &[TypeTag] {
        match self {
            Operation::Generator(_) => &[],
            Operation::Transform(t) => &t.inputs,
            Operation::Check(c) => &c.inputs,
        }
    }

    pub fn outputs(&self) -> &[TypeTag] {
        match self {
            Operation::Generator(g) => std::slice::from_ref(&g.output),
            Operation::Transform(t) => &t.outputs,
            Operation::Check(_) => &[],
        }
    }

    pub fn is_generator(&self) -> bool {
        matches!(self, Operation::Generator(_))
    }

    /// Number of values required per tag before this operation can run.
    pub fn requirements(&self) -> BTreeMap<TypeTag, usize> {
        let mut needed = BTreeMap::new();
        for tag in self.inputs() {
            *needed.entry(tag.clone()).or_insert(0) += 1;
        }
        needed
    }

    /// Every tag this operation touches, inputs first.
    pub fn tags(&self) -> impl Iterator<Item = &TypeTag> {
        self.inputs().iter().chain(self.outputs().iter())
    }

    /// Structural checks performed at registration time.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidOperation {
            name: self.name().to_string(),
            reason: reason.to_string(),
        };

        if self.name().trim().is_empty() {
            return Err(invalid("operation name must not be empty"));
        }

        match self {
            Operation::Generator(_) => Ok(()),
            Operation::Transform(t) => {
                if t.inputs.is_empty() {
                    return Err(invalid("a transform needs at least one input; use a generator"));
                }
                if let Effect::Rearrange(indices) = &t.effect {
                    if let Some(bad) = indices.iter().find(|&&i| i >= t.inputs.len()) {
                        return Err(invalid(&format!(
                            "rearrange index {} out of range for {} input(s)",
                            bad,
                            t.inputs.len()
                        )));
                    }
                }
                Ok(())
            }
            Operation::Check(c) => {
                if c.inputs.is_empty() {
                    return Err(invalid("a check needs at least one input"));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("inputs", &self.inputs())
            .field("outputs", &self.outputs())
            .finish()
    }
}

impl From<Generator> for Operation {
    fn from(g: Generator) -> Self {
        Operation::Generator(g)
    }
}

impl From<Transform> for Operation {
    fn from(t: Transform) -> Self {
        Operation::Transform(t)
    }
}

impl From<Check> for Operation {
    fn from(c: Check) -> Self {
        Operation::Check(c)
    }
}

/// Produces a fresh value for one tag.
#[derive(Clone)]
pub struct Generator {
    name: String,
    output: TypeTag,
    draw: DrawFn,
}

impl Generator {
    pub fn new<F>(name: impl Into<String>, output: TypeTag, draw: F) -> Self
    where
        F: Fn(&mut dyn RngCore) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            output,
            draw: Arc::new(draw),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> &TypeTag {
        &self.output
    }

    /// Draw one value. Panics inside the user function become errors.
    pub fn draw(&self, rng: &mut dyn RngCore) -> Result<Value, OperationError> {
        guarded(&self.name, || Ok((self.draw)(rng)))
    }
}

/// What a transform does with the values it pops.
#[derive(Clone)]
pub enum Effect {
    /// Computes new values.
    Compute(ComputeFn),
    /// Re-pushes copies of the inputs at the given positions. Inputs and
    /// outputs are both listed top of stack first.
    Rearrange(Vec<usize>),
}

#[derive(Clone)]
pub struct Transform {
    name: String,
    inputs: Vec<TypeTag>,
    outputs: Vec<TypeTag>,
    effect: Effect,
    notation: Option<String>,
}

impl Transform {
    pub fn compute<F>(
        name: impl Into<String>,
        inputs: Vec<TypeTag>,
        outputs: Vec<TypeTag>,
        apply: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs,
            outputs,
            effect: Effect::Compute(Arc::new(apply)),
            notation: None,
        }
    }

    /// Stack manipulation: output `i` is a copy of input `indices[i]`.
    /// Position 0 is the top of the stack on both sides, so `swap` is
    /// `[1, 0]` and `rot` is `[2, 0, 1]`.
    pub fn rearrange(name: impl Into<String>, inputs: Vec<TypeTag>, indices: Vec<usize>) -> Self {
        let outputs = indices
            .iter()
            .filter_map(|&i| inputs.get(i).cloned())
            .collect();
        Self {
            name: name.into(),
            inputs,
            outputs,
            effect: Effect::Rearrange(indices),
            notation: None,
        }
    }

    /// Infix or custom notation for traces, e.g. `"{0} + {1}"`.
    pub fn with_notation(mut self, notation: impl Into<String>) -> Self {
        self.notation = Some(notation.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[TypeTag] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TypeTag] {
        &self.outputs
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn notation(&self) -> Option<&str> {
        self.notation.as_deref()
    }

    pub fn is_rearrangement(&self) -> bool {
        matches!(self.effect, Effect::Rearrange(_))
    }

    /// Apply a compute effect. Rearrangements are resolved by the executor.
    pub fn apply(&self, args: &[Value]) -> Result<Vec<Value>, OperationError> {
        match &self.effect {
            Effect::Compute(f) => guarded(&self.name, || {
                f(args).map_err(|msg| OperationError::new(&self.name, msg))
            }),
            Effect::Rearrange(indices) => Ok(indices.iter().map(|&i| args[i].clone()).collect()),
        }
    }
}

/// A non-mutating property over the most recent stack values.
#[derive(Clone)]
pub struct Check {
    name: String,
    inputs: Vec<TypeTag>,
    predicate: PredicateFn,
}

impl Check {
    pub fn new<F>(name: impl Into<String>, inputs: Vec<TypeTag>, predicate: F) -> Self
    where
        F: Fn(&[Value]) -> Result<bool, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs,
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[TypeTag] {
        &self.inputs
    }

    pub fn evaluate(&self, args: &[Value]) -> Result<bool, OperationError> {
        guarded(&self.name, || {
            (self.predicate)(args).map_err(|msg| OperationError::new(&self.name, msg))
        })
    }
}

/// Run user code, turning a panic into an [`OperationError`].
fn guarded<T>(
    name: &str,
    f: impl FnOnce() -> Result<T, OperationError>,
) -> Result<T, OperationError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(OperationError::new(
            name,
            format!("panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

/// Text of a panic payload, when it carries any.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}
