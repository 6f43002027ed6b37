//! Metadata source traits for live schema introspection

use schemaward_core::{Column, RawRow};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Column properties reported by the database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnMetadata {
    /// Type name as reported by the database (e.g. `character varying`)
    pub reported_type: String,

    /// Whether the column accepts NULL
    pub nullable: bool,
}

impl ColumnMetadata {
    pub fn new(reported_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            reported_type: reported_type.into(),
            nullable,
        }
    }
}

/// One flat row of column metadata, as returned by an introspection query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table: String,
    pub column: String,
    pub metadata: ColumnMetadata,
}

/// Column metadata grouped by table name, then column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCatalog {
    tables: HashMap<String, HashMap<String, ColumnMetadata>>,
}

impl ColumnCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group flat metadata rows by table and column
    pub fn from_rows(rows: impl IntoIterator<Item = ColumnRow>) -> Self {
        let mut catalog = Self::new();
        for row in rows {
            catalog.insert(row.table, row.column, row.metadata);
        }
        catalog
    }

    pub fn insert(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        metadata: ColumnMetadata,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into(), metadata);
    }

    /// All columns reported for a table
    pub fn table(&self, table: &str) -> Option<&HashMap<String, ColumnMetadata>> {
        self.tables.get(table)
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnMetadata> {
        self.tables.get(table).and_then(|columns| columns.get(column))
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Errors that can occur while introspecting the database
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Read-only view of the live database schema
///
/// Implementations must answer each call from a single query so that a
/// schema assertion costs at most two round trips.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Get the source name (e.g., "PostgreSQL")
    fn name(&self) -> &'static str;

    /// Return the subset of `candidates` that exist as tables
    async fn list_existing_tables(
        &self,
        candidates: &BTreeSet<String>,
    ) -> Result<HashSet<String>, FetchError>;

    /// Fetch column metadata for every column of the given tables
    async fn list_columns(&self, tables: &BTreeSet<String>) -> Result<ColumnCatalog, FetchError>;

    /// Test the connection to the database
    async fn test_connection(&self) -> Result<(), FetchError>;
}

/// Executes caller-supplied SQL and returns raw rows
///
/// `columns` lists the declared columns the caller expects, so the source
/// knows how to read each value.
#[async_trait::async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, sql: &str, columns: &[Column]) -> Result<Vec<RawRow>, FetchError>;
}
