//! Metadata sources for live schema introspection
//!
//! A [`MetadataSource`] answers two questions about a database: which of a
//! set of tables exist, and what columns those tables have. The schema
//! comparator asks each question once per assertion.
//!
//! ## Features
//!
//! - `postgres` - PostgreSQL support via `tokio-postgres`
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemaward_catalog::{MetadataSource, PostgresSource};
//!
//! let source = PostgresSource::from_config(&config).await?;
//! let existing = source.list_existing_tables(&names).await?;
//! ```

pub mod adapter;
pub mod mock;
pub mod postgres;

pub use adapter::{ColumnCatalog, ColumnMetadata, ColumnRow, FetchError, MetadataSource, RowSource};
pub use mock::{MockSource, MockSourceBuilder};
pub use postgres::PostgresSource;
