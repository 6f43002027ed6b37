//! SchemaWard engine
//!
//! This crate implements schema assertion on top of a metadata source:
//! - Two-phase schema comparison
//! - Aggregate assertion errors
//! - A client that also decodes query rows by table declaration

pub mod client;
pub mod comparator;
pub mod error;

pub use client::Client;
pub use comparator::{assert_schema, check_column, collect_issues, compare_table};
pub use error::{AssertError, QueryError};
