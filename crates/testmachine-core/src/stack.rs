//! Stack Machine: one LIFO stack per tag, the only mutable state of a trial.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::StackUnderflow;
use crate::tag::TypeTag;
use crate::value::Value;

/// Trace variable naming a value (`t1`, `t2`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Var(pub u32);

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A value together with the variable that introduced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub var: Var,
    pub value: Value,
}

#[derive(Debug, Default)]
pub struct StackMachine {
    stacks: HashMap<TypeTag, Vec<Binding>>,
    next_var: u32,
}

impl StackMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next trace variable.
    pub fn fresh_var(&mut self) -> Var {
        self.next_var += 1;
        Var(self.next_var)
    }

    pub fn push(&mut self, tag: &TypeTag, binding: Binding) {
        self.stacks.entry(tag.clone()).or_default().push(binding);
    }

    pub fn pop(&mut self, tag: &TypeTag) -> Result<Binding, StackUnderflow> {
        self.stacks
            .get_mut(tag)
            .and_then(|stack| stack.pop())
            .ok_or_else(|| StackUnderflow {
                tag: tag.name().to_string(),
                required: 1,
                available: 0,
            })
    }

    /// The `n` most recent bindings of `tag`, oldest first.
    pub fn peek(&self, tag: &TypeTag, n: usize) -> Result<&[Binding], StackUnderflow> {
        let stack = self.stacks.get(tag).map(Vec::as_slice).unwrap_or(&[]);
        if stack.len() < n {
            return Err(StackUnderflow {
                tag: tag.name().to_string(),
                required: n,
                available: stack.len(),
            });
        }
        Ok(&stack[stack.len() - n..])
    }

    pub fn depth(&self, tag: &TypeTag) -> usize {
        self.stacks.get(tag).map_or(0, Vec::len)
    }

    /// Gather the arguments for an operation declaring `inputs`.
    ///
    /// Each tag contributes its top `k` values, most recent first, assigned
    /// left to right to that tag's positions. With `consume` the values are popped;
    /// otherwise the stacks are left untouched. All depths are checked before
    /// anything is removed.
    pub fn take_args(&mut self, inputs: &[TypeTag], consume: bool) -> Result<Vec<Binding>, StackUnderflow> {
        let mut needed: BTreeMap<&TypeTag, usize> = BTreeMap::new();
        for tag in inputs {
            *needed.entry(tag).or_insert(0) += 1;
        }

        let mut slices: BTreeMap<&TypeTag, std::vec::IntoIter<Binding>> = BTreeMap::new();
        for (&tag, &count) in &needed {
            let top: Vec<Binding> = self.peek(tag, count)?.iter().rev().cloned().collect();
            slices.insert(tag, top.into_iter());
        }

        if consume {
            for (&tag, &count) in &needed {
                if let Some(stack) = self.stacks.get_mut(tag) {
                    let keep = stack.len() - count;
                    stack.truncate(keep);
                }
            }
        }

        let args = inputs
            .iter()
            .filter_map(|tag| slices.get_mut(tag).and_then(Iterator::next))
            .collect();
        Ok(args)
    }

    /// Snapshot of every non-empty stack, for diagnostics.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Value>> {
        self.stacks
            .iter()
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(tag, stack)| {
                (
                    tag.name().to_string(),
                    stack.iter().map(|b| b.value.clone()).collect(),
                )
            })
            .collect()
    }
}
