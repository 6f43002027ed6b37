//! In-memory metadata source for testing
//!
//! This source answers introspection calls from predefined tables without
//! connecting to any database. It's useful for:
//! - Unit testing the schema comparator
//! - Counting introspection round trips
//! - Simulating failures in either introspection phase
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemaward_catalog::{MockSource, MetadataSource};
//!
//! let source = MockSource::builder()
//!     .with_column("users", "id", "integer", false)
//!     .with_column("users", "name", "text", true)
//!     .build();
//!
//! let existing = source.list_existing_tables(&names).await?;
//! ```

use crate::adapter::{ColumnCatalog, ColumnMetadata, FetchError, MetadataSource, RowSource};
use schemaward_core::{Column, RawRow};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

type TableMap = HashMap<String, Vec<(String, ColumnMetadata)>>;

/// Mock metadata source for testing
///
/// Clones share state, so a test can keep a handle for inspecting call
/// counts after handing the source to the code under test.
#[derive(Clone)]
pub struct MockSource {
    /// Tables and their columns, in insertion order
    tables: Arc<RwLock<TableMap>>,

    /// Rows returned for an exact SQL string
    rows: Arc<RwLock<HashMap<String, Vec<RawRow>>>>,

    /// Error returned by `list_existing_tables`
    tables_error: Arc<RwLock<Option<FetchError>>>,

    /// Error returned by `list_columns`
    columns_error: Arc<RwLock<Option<FetchError>>>,

    table_calls: Arc<AtomicUsize>,
    column_calls: Arc<AtomicUsize>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,
}

impl MockSource {
    /// Create a new mock source with no tables
    pub fn new() -> Self {
        MockSourceBuilder::new().build()
    }

    pub fn builder() -> MockSourceBuilder {
        MockSourceBuilder::new()
    }

    /// Register an empty table
    pub async fn add_table(&self, table: &str) {
        self.tables.write().await.entry(table.to_string()).or_default();
    }

    /// Register a column, creating its table if needed
    pub async fn add_column(&self, table: &str, column: &str, reported_type: &str, nullable: bool) {
        let mut tables = self.tables.write().await;
        let columns = tables.entry(table.to_string()).or_default();
        columns.retain(|(name, _)| name != column);
        columns.push((column.to_string(), ColumnMetadata::new(reported_type, nullable)));
    }

    pub async fn drop_table(&self, table: &str) {
        self.tables.write().await.remove(table);
    }

    pub async fn drop_column(&self, table: &str, column: &str) {
        if let Some(columns) = self.tables.write().await.get_mut(table) {
            columns.retain(|(name, _)| name != column);
        }
    }

    /// Rows to return when `sql` is executed
    pub async fn add_rows(&self, sql: &str, rows: Vec<RawRow>) {
        self.rows.write().await.insert(sql.to_string(), rows);
    }

    /// Fail the next and all later `list_existing_tables` calls
    pub async fn fail_tables_with(&self, error: FetchError) {
        *self.tables_error.write().await = Some(error);
    }

    /// Fail the next and all later `list_columns` calls
    pub async fn fail_columns_with(&self, error: FetchError) {
        *self.columns_error.write().await = Some(error);
    }

    /// Clear configured errors
    pub async fn clear_errors(&self) {
        *self.tables_error.write().await = None;
        *self.columns_error.write().await = None;
    }

    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    /// Number of `list_existing_tables` calls so far
    pub fn table_calls(&self) -> usize {
        self.table_calls.load(Ordering::SeqCst)
    }

    /// Number of `list_columns` calls so far
    pub fn column_calls(&self) -> usize {
        self.column_calls.load(Ordering::SeqCst)
    }

    /// Total introspection round trips so far
    pub fn round_trips(&self) -> usize {
        self.table_calls() + self.column_calls()
    }

    /// Simulate latency if configured
    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MetadataSource for MockSource {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn list_existing_tables(
        &self,
        candidates: &BTreeSet<String>,
    ) -> Result<HashSet<String>, FetchError> {
        self.table_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(error) = self.tables_error.read().await.as_ref() {
            return Err(error.clone());
        }

        let tables = self.tables.read().await;
        Ok(candidates
            .iter()
            .filter(|name| tables.contains_key(name.as_str()))
            .cloned()
            .collect())
    }

    async fn list_columns(&self, tables: &BTreeSet<String>) -> Result<ColumnCatalog, FetchError> {
        self.column_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(error) = self.columns_error.read().await.as_ref() {
            return Err(error.clone());
        }

        let known = self.tables.read().await;
        let mut catalog = ColumnCatalog::new();
        for table in tables {
            if let Some(columns) = known.get(table) {
                for (column, metadata) in columns {
                    catalog.insert(table.clone(), column.clone(), metadata.clone());
                }
            }
        }
        Ok(catalog)
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.simulate_latency().await;

        if self.fail_connection {
            Err(FetchError::NetworkError(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl RowSource for MockSource {
    async fn fetch_rows(&self, sql: &str, _columns: &[Column]) -> Result<Vec<RawRow>, FetchError> {
        self.simulate_latency().await;

        self.rows
            .read()
            .await
            .get(sql)
            .cloned()
            .ok_or_else(|| FetchError::QueryError(format!("No rows registered for query: {}", sql)))
    }
}

/// Builder for creating a MockSource with predefined tables
///
/// # Example
///
/// ```rust,ignore
/// let source = MockSourceBuilder::new()
///     .with_column("users", "id", "integer", false)
///     .with_table("audit_log")
///     .with_latency(50)
///     .build();
/// ```
pub struct MockSourceBuilder {
    tables: TableMap,
    tables_error: Option<FetchError>,
    columns_error: Option<FetchError>,
    fail_connection: bool,
    latency_ms: u64,
}

impl MockSourceBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            tables_error: None,
            columns_error: None,
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Add a table with no columns
    pub fn with_table(mut self, table: &str) -> Self {
        self.tables.entry(table.to_string()).or_default();
        self
    }

    /// Add a column, creating its table if needed
    ///
    /// Declaring the same column again replaces the earlier entry.
    pub fn with_column(mut self, table: &str, column: &str, reported_type: &str, nullable: bool) -> Self {
        let columns = self.tables.entry(table.to_string()).or_default();
        columns.retain(|(name, _)| name != column);
        columns.push((column.to_string(), ColumnMetadata::new(reported_type, nullable)));
        self
    }

    /// Fail `list_existing_tables` with `error`
    pub fn with_tables_error(mut self, error: FetchError) -> Self {
        self.tables_error = Some(error);
        self
    }

    /// Fail `list_columns` with `error`
    pub fn with_columns_error(mut self, error: FetchError) -> Self {
        self.columns_error = Some(error);
        self
    }

    /// Configure connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Build the MockSource
    pub fn build(self) -> MockSource {
        MockSource {
            tables: Arc::new(RwLock::new(self.tables)),
            rows: Arc::new(RwLock::new(HashMap::new())),
            tables_error: Arc::new(RwLock::new(self.tables_error)),
            columns_error: Arc::new(RwLock::new(self.columns_error)),
            table_calls: Arc::new(AtomicUsize::new(0)),
            column_calls: Arc::new(AtomicUsize::new(0)),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

impl Default for MockSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
