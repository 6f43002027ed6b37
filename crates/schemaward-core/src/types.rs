//! Declared data types and their compatibility with database-reported types
//!
//! The set of primitive kinds is closed. Adding a kind means adding a
//! [`PrimitiveType`] variant and its [`PrimitiveDescriptor`] entry; there is
//! no runtime dispatch beyond the registry lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host value type a primitive decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    I32,
    I64,
    String,
    Bool,
}

impl HostType {
    /// Rust spelling of the host type
    pub fn rust_name(&self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::String => "String",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name())
    }
}

/// Registry entry describing one primitive kind
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveDescriptor {
    /// Label used in declarations and diagnostics
    pub label: &'static str,

    /// Whether a type name reported by the database satisfies this kind
    pub compatible: fn(&str) -> bool,

    /// Value type produced when decoding rows
    pub host: HostType,
}

const INTEGER: PrimitiveDescriptor = PrimitiveDescriptor {
    label: "integer",
    compatible: |reported| reported == "integer",
    host: HostType::I32,
};

const BIGINT: PrimitiveDescriptor = PrimitiveDescriptor {
    label: "bigint",
    compatible: |reported| reported == "bigint",
    host: HostType::I64,
};

const TEXT: PrimitiveDescriptor = PrimitiveDescriptor {
    label: "text",
    compatible: |reported| reported == "text" || reported == "character varying",
    host: HostType::String,
};

const BOOLEAN: PrimitiveDescriptor = PrimitiveDescriptor {
    label: "boolean",
    compatible: |reported| reported == "boolean",
    host: HostType::Bool,
};

/// Atomic declared data kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Integer,
    BigInt,
    Text,
    Boolean,
}

impl PrimitiveType {
    /// Every registered kind, in registry order
    pub const ALL: [PrimitiveType; 4] = [Self::Integer, Self::BigInt, Self::Text, Self::Boolean];

    /// Registry entry for this kind
    pub fn descriptor(&self) -> &'static PrimitiveDescriptor {
        match self {
            Self::Integer => &INTEGER,
            Self::BigInt => &BIGINT,
            Self::Text => &TEXT,
            Self::Boolean => &BOOLEAN,
        }
    }

    pub fn label(&self) -> &'static str {
        self.descriptor().label
    }

    pub fn host_type(&self) -> HostType {
        self.descriptor().host
    }

    /// Check whether a database-reported type name is acceptable for this kind
    ///
    /// Matching is exact: `information_schema` reports lowercase names such as
    /// `integer` or `character varying`.
    pub fn is_compatible(&self, reported: &str) -> bool {
        (self.descriptor().compatible)(reported)
    }

    /// Look up a kind by its label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }

    /// Mark this kind as permitting absent values
    pub fn null(self) -> NullableType {
        NullableType { inner: self }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A primitive that permits absence of value
///
/// Only ever wraps a [`PrimitiveType`], so nullability cannot nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NullableType {
    inner: PrimitiveType,
}

impl NullableType {
    pub fn inner(&self) -> PrimitiveType {
        self.inner
    }

    pub fn label(&self) -> String {
        format!("{} null", self.inner.label())
    }
}

impl fmt::Display for NullableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} null", self.inner)
    }
}

/// Type attached to a column declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeclaredType {
    Primitive { primitive: PrimitiveType },
    Nullable { primitive: PrimitiveType },
}

impl DeclaredType {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Nullable { .. })
    }

    /// The primitive kind, unwrapping nullability
    pub fn primitive_of(&self) -> PrimitiveType {
        match self {
            Self::Primitive { primitive } | Self::Nullable { primitive } => *primitive,
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl From<PrimitiveType> for DeclaredType {
    fn from(primitive: PrimitiveType) -> Self {
        Self::Primitive { primitive }
    }
}

impl From<NullableType> for DeclaredType {
    fn from(nullable: NullableType) -> Self {
        Self::Nullable { primitive: nullable.inner }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { primitive } => write!(f, "{}", primitive),
            Self::Nullable { primitive } => write!(f, "{}", primitive.null()),
        }
    }
}

/// Error returned when a type label cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown data type: '{0}'")]
pub struct UnknownTypeError(pub String);

impl FromStr for DeclaredType {
    type Err = UnknownTypeError;

    /// Parse a label such as `integer` or `text null`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, nullable) = match trimmed.strip_suffix(" null") {
            Some(base) => (base.trim_end(), true),
            None => (trimmed, false),
        };

        let primitive = PrimitiveType::from_label(base)
            .ok_or_else(|| UnknownTypeError(s.to_string()))?;

        Ok(if nullable {
            primitive.null().into()
        } else {
            primitive.into()
        })
    }
}

/// Shorthand for [`PrimitiveType::Integer`]
pub fn integer() -> PrimitiveType {
    PrimitiveType::Integer
}

/// Shorthand for [`PrimitiveType::BigInt`]
pub fn bigint() -> PrimitiveType {
    PrimitiveType::BigInt
}

/// Shorthand for [`PrimitiveType::Text`]
pub fn text() -> PrimitiveType {
    PrimitiveType::Text
}

/// Shorthand for [`PrimitiveType::Boolean`]
pub fn boolean() -> PrimitiveType {
    PrimitiveType::Boolean
}
