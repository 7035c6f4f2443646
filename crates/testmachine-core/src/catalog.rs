//! Operation Catalog
//!
//! Registry of every operation a program may use, indexed by input tags.
//! Populated once before a search and shared read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::operation::Operation;
use crate::tag::{TypeTag, ValueKind};

/// Position of an operation in its catalog. Stable for the catalog's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub usize);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperationCatalog {
    operations: Vec<Arc<Operation>>,
    requirements: Vec<Vec<(TypeTag, usize)>>,
    names: HashMap<String, OperationId>,
    kinds: BTreeMap<String, ValueKind>,
    by_inputs: BTreeMap<Vec<TypeTag>, Vec<OperationId>>,
}

impl OperationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under its declared input tags.
    ///
    /// Nothing is recorded when an error is returned.
    pub fn register(&mut self, operation: impl Into<Operation>) -> Result<OperationId, ConfigurationError> {
        let operation = operation.into();
        operation.validate()?;

        if self.names.contains_key(operation.name()) {
            return Err(ConfigurationError::DuplicateOperation(
                operation.name().to_string(),
            ));
        }

        let mut pending: BTreeMap<String, ValueKind> = BTreeMap::new();
        for tag in operation.tags() {
            let existing = self
                .kinds
                .get(tag.name())
                .or_else(|| pending.get(tag.name()))
                .copied();
            match existing {
                Some(kind) if kind != tag.kind() => {
                    return Err(ConfigurationError::IncompatibleTag {
                        tag: tag.name().to_string(),
                        existing: kind,
                        declared: tag.kind(),
                        operation: operation.name().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    pending.insert(tag.name().to_string(), tag.kind());
                }
            }
        }
        self.kinds.extend(pending);

        let id = OperationId(self.operations.len());
        self.names.insert(operation.name().to_string(), id);
        self.by_inputs
            .entry(operation.inputs().to_vec())
            .or_default()
            .push(id);
        self.requirements
            .push(operation.requirements().into_iter().collect());
        self.operations.push(Arc::new(operation));

        Ok(id)
    }

    pub fn get(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(id.0).map(|op| op.as_ref())
    }

    pub fn find(&self, name: &str) -> Option<(OperationId, &Operation)> {
        let id = *self.names.get(name)?;
        self.get(id).map(|op| (id, op))
    }

    /// Operations whose full input-tag list equals `tags`, in registration order.
    pub fn operations_for(&self, tags: &[TypeTag]) -> Vec<(OperationId, &Operation)> {
        self.by_inputs
            .get(tags)
            .map(|ids| {
                ids.iter()
                    .filter_map(|&id| self.get(id).map(|op| (id, op)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Operations whose inputs are satisfiable at the given depths, in
    /// registration order.
    pub fn applicable<F>(&self, depth: F) -> Vec<OperationId>
    where
        F: Fn(&TypeTag) -> usize,
    {
        self.requirements
            .iter()
            .enumerate()
            .filter(|(_, needs)| needs.iter().all(|(tag, count)| depth(tag) >= *count))
            .map(|(i, _)| OperationId(i))
            .collect()
    }

    pub fn kind_of(&self, tag_name: &str) -> Option<ValueKind> {
        self.kinds.get(tag_name).copied()
    }

    /// Every tag name seen so far with its representation.
    pub fn tags(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.kinds.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = (OperationId, &Operation)> {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, op)| (OperationId(i), op.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// True when at least one generator feeds `tag`.
    pub fn has_generator_for(&self, tag: &TypeTag) -> bool {
        self.operations
            .iter()
            .any(|op| op.is_generator() && op.outputs().first() == Some(tag))
    }
}
