//! Type tags: named value categories that partition the stacks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Representation of the values stored under a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Float,
    Integer,
    Boolean,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Float => "float",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A named stack. The catalog guarantees that one name maps to one kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag {
    name: Arc<str>,
    kind: ValueKind,
}

impl TypeTag {
    pub fn new(name: impl AsRef<str>, kind: ValueKind) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            kind,
        }
    }

    pub fn float(name: impl AsRef<str>) -> Self {
        Self::new(name, ValueKind::Float)
    }

    pub fn integer(name: impl AsRef<str>) -> Self {
        Self::new(name, ValueKind::Integer)
    }

    pub fn boolean(name: impl AsRef<str>) -> Self {
        Self::new(name, ValueKind::Boolean)
    }

    pub fn text(name: impl AsRef<str>) -> Self {
        Self::new(name, ValueKind::Text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("TypeTag", 2)?;
        state.serialize_field("name", &*self.name)?;
        state.serialize_field("kind", &self.kind)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            kind: ValueKind,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(TypeTag::new(raw.name, raw.kind))
    }
}
