//! SchemaWard Core
//!
//! Declared table model, the primitive type registry, row shapes and the
//! issue types produced by schema assertions.

pub mod config;
pub mod issue;
pub mod row;
pub mod table;
pub mod types;

pub use config::{Config, ConfigError, ConnectionConfig, DEFAULT_SCHEMA};
pub use issue::{Issue, SchemaAssertionError};
pub use row::{DecodeError, FieldShape, FromValue, RawRow, Row, RowShape, Value};
pub use table::{column, Column, ColumnDef, SchemaError, Table, TableBuilder};
pub use types::{
    bigint, boolean, integer, text, DeclaredType, HostType, NullableType, PrimitiveDescriptor,
    PrimitiveType, UnknownTypeError,
};
