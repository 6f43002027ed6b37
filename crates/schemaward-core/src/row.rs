//! Result row shapes derived from table declarations
//!
//! Each [`Table`](crate::Table) carries a [`RowShape`] built at construction.
//! The shape maps every column to a host value type and decodes raw rows
//! (keyed by database column name) into [`Row`]s keyed by declaration key.
//!
//! Decoding does not check values against the declared types. A mismatch
//! only surfaces when a caller asks for a typed value with [`Row::get`].

use crate::table::Column;
use crate::types::HostType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single value read from the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i32),
    BigInt(i64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::BigInt(_) => "bigint",
            Self::Text(_) => "text",
            Self::Boolean(_) => "boolean",
        }
    }
}

/// Raw database row keyed by column name
pub type RawRow = HashMap<String, Value>;

/// Errors raised while decoding or reading rows
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Column '{0}' is missing from the result row")]
    MissingColumn(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' holds a {actual} value, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// How one declared column appears in a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldShape {
    /// Declaration key; the field name in decoded rows
    pub key: String,

    /// Database column the value is read from
    pub column: String,

    pub host: HostType,

    pub nullable: bool,
}

impl FieldShape {
    /// Rust spelling of the field type, e.g. `Option<String>`
    pub fn rust_type(&self) -> String {
        if self.nullable {
            format!("Option<{}>", self.host)
        } else {
            self.host.to_string()
        }
    }
}

/// Ordered field layout of rows returned for a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowShape {
    fields: Vec<FieldShape>,
}

impl RowShape {
    pub(crate) fn for_columns(columns: &[Column]) -> Self {
        let fields = columns
            .iter()
            .map(|column| FieldShape {
                key: column.key().to_string(),
                column: column.name().to_string(),
                host: column.data_type().primitive_of().host_type(),
                nullable: column.data_type().is_null(),
            })
            .collect();

        Self { fields }
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Re-key a raw row by declaration key
    ///
    /// Columns in `raw` that the table does not declare are ignored.
    pub fn decode(&self, raw: &RawRow) -> Result<Row, DecodeError> {
        let mut values = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let value = raw
                .get(&field.column)
                .ok_or_else(|| DecodeError::MissingColumn(field.column.clone()))?;
            values.push((field.key.clone(), value.clone()));
        }

        Ok(Row { values })
    }
}

/// Decoded row keyed by declaration key, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    values: Vec<(String, Value)>,
}

impl Row {
    /// Raw value of a field
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Typed value of a field
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T, DecodeError> {
        let value = self
            .value(key)
            .ok_or_else(|| DecodeError::UnknownField(key.to_string()))?;

        T::from_value(value).ok_or_else(|| DecodeError::TypeMismatch {
            field: key.to_string(),
            expected: T::EXPECTED,
            actual: value.kind(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Conversion from a [`Value`] into a host type
pub trait FromValue: Sized {
    /// Description used in mismatch errors
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "bigint";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::BigInt(v) => Some(*v),
            Value::Integer(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
