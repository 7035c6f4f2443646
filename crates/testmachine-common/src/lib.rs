//! TestMachine Common: stock operations for everyday searches.
//!
//! Nothing here is special to the engine; every operation is built through
//! the public `Generator` / `Transform` / `Check` constructors and can be
//! registered with `TestMachine::add`.
//!
//! ```text
//! generators  ──▶ uniform_floats, integers_in
//! stack       ──▶ dup, drop, swap, rot
//! arithmetic  ──▶ add, sub, mul, div   (floats: IEEE, integers: checked)
//! ```

mod arithmetic;
mod basic;

pub use arithmetic::arithmetic_operations;
pub use basic::basic_operations;

use rand::Rng;
use std::ops::Range;
use testmachine_core::{Check, Generator, TypeTag, Value};

// ============================================================================
// HELPERS
// ============================================================================

/// A generator drawing from `f`.
pub fn generate<F>(name: impl Into<String>, tag: TypeTag, f: F) -> Generator
where
    F: Fn(&mut dyn rand::RngCore) -> Value + Send + Sync + 'static,
{
    Generator::new(name, tag, f)
}

/// A check over the most recent values of `tags`.
pub fn check<F>(name: impl Into<String>, tags: Vec<TypeTag>, predicate: F) -> Check
where
    F: Fn(&[Value]) -> Result<bool, String> + Send + Sync + 'static,
{
    Check::new(name, tags, predicate)
}

// ============================================================================
// GENERATORS
// ============================================================================

/// Floats drawn uniformly from `[0, 1)`. Registered through
/// `TestMachine::add_operation`, a clashing name gets a numeric suffix.
pub fn uniform_floats(tag: TypeTag) -> Generator {
    let name = format!("generate_{}", tag.name());
    generate(name, tag, |rng| Value::Float(rng.gen::<f64>()))
}

/// Integers drawn uniformly from `range`.
pub fn integers_in(tag: TypeTag, range: Range<i64>) -> Generator {
    let name = format!("generate_{}", tag.name());
    generate(name, tag, move |rng| Value::Integer(rng.gen_range(range.clone())))
}

/// Qualify a stock operation name with its tag, so the same catalog can be
/// registered for several tags.
pub(crate) fn qualified(operation: &str, tag: &TypeTag) -> String {
    format!("{}_{}", operation, tag.name())
}
