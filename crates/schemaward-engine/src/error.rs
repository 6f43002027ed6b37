//! Errors returned by schema assertions and queries

use schemaward_catalog::FetchError;
use schemaward_core::{DecodeError, Issue, SchemaAssertionError};

/// Failure of a schema assertion
#[derive(Debug, thiserror::Error)]
pub enum AssertError {
    /// Introspection failed; no issues were collected
    #[error("Schema introspection failed: {0}")]
    Introspection(#[from] FetchError),

    /// Introspection succeeded and found discrepancies
    #[error(transparent)]
    Schema(#[from] SchemaAssertionError),
}

impl AssertError {
    /// Issues carried by the error (empty for introspection failures)
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::Introspection(_) => &[],
            Self::Schema(err) => err.issues(),
        }
    }
}

/// Failure of a typed query
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Query failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Cannot decode row: {0}")]
    Decode(#[from] DecodeError),
}
