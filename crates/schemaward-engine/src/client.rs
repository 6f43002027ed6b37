//! Client bundling a metadata source with assertions and typed queries

use crate::comparator;
use crate::error::{AssertError, QueryError};
use schemaward_catalog::{FetchError, MetadataSource, RowSource};
use schemaward_core::{Issue, Row, Table};

/// Database handle for schema assertions and queries
///
/// # Example
///
/// ```rust,ignore
/// let client = Client::new(PostgresSource::from_config(&config).await?);
///
/// let users = Table::builder("users")
///     .column("id", column(integer()))
///     .column("desc", column(text().null()).named("description"))
///     .build()?;
///
/// client.assert_schema(&[users.clone()]).await?;
/// let rows = client.query(&users, "SELECT id, description FROM users").await?;
/// ```
pub struct Client<S> {
    source: S,
}

impl<S> Client<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: MetadataSource> Client<S> {
    /// See [`comparator::assert_schema`]
    pub async fn assert_schema(&self, tables: &[Table]) -> Result<(), AssertError> {
        comparator::assert_schema(&self.source, tables).await
    }

    /// See [`comparator::collect_issues`]
    pub async fn collect_issues(&self, tables: &[Table]) -> Result<Vec<Issue>, FetchError> {
        comparator::collect_issues(&self.source, tables).await
    }
}

impl<S: RowSource> Client<S> {
    /// Run `sql` and decode every row with the table's row shape
    pub async fn query(&self, table: &Table, sql: &str) -> Result<Vec<Row>, QueryError> {
        let raw_rows = self.source.fetch_rows(sql, table.columns()).await?;
        tracing::debug!(table = table.name(), rows = raw_rows.len(), "decoding query result");

        let shape = table.row_shape();
        let rows = raw_rows
            .iter()
            .map(|raw| shape.decode(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaward_catalog::MockSource;
    use schemaward_core::{column, integer, text, RawRow, Value};

    fn users() -> Table {
        Table::builder("users")
            .column("id", column(integer()))
            .column("desc", column(text().null()).named("description"))
            .build()
            .unwrap()
    }

    fn raw(id: i32, description: Option<&str>) -> RawRow {
        let mut row = RawRow::new();
        row.insert("id".to_string(), Value::Integer(id));
        row.insert(
            "description".to_string(),
            description.map_or(Value::Null, |d| Value::Text(d.to_string())),
        );
        row
    }

    #[tokio::test]
    async fn test_client_assert_schema() {
        let client = Client::new(
            MockSource::builder()
                .with_column("users", "id", "integer", false)
                .with_column("users", "description", "text", true)
                .build(),
        );

        client.assert_schema(&[users()]).await.unwrap();
        assert!(client.collect_issues(&[users()]).await.unwrap().is_empty());
        assert_eq!(client.source().round_trips(), 4);
    }

    #[tokio::test]
    async fn test_client_query_decodes_rows() {
        let source = MockSource::new();
        let sql = "SELECT id, description FROM users";
        source.add_rows(sql, vec![raw(1, Some("first")), raw(2, None)]).await;

        let client = Client::new(source);
        let rows = client.query(&users(), sql).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get::<i32>("id").unwrap(), 1);
        assert_eq!(rows[0].get::<Option<String>>("desc").unwrap(), Some("first".to_string()));
        assert_eq!(rows[1].get::<Option<String>>("desc").unwrap(), None);
    }

    #[tokio::test]
    async fn test_client_query_missing_column() {
        let source = MockSource::new();
        let mut partial = RawRow::new();
        partial.insert("id".to_string(), Value::Integer(1));
        source.add_rows("SELECT id FROM users", vec![partial]).await;

        let client = Client::new(source);
        let err = client.query(&users(), "SELECT id FROM users").await.unwrap_err();

        assert!(matches!(err, QueryError::Decode(_)));
        assert!(err.to_string().contains("description"));
    }

    #[tokio::test]
    async fn test_client_query_fetch_error() {
        let client = Client::new(MockSource::new());
        let err = client.query(&users(), "SELECT 1").await.unwrap_err();

        assert!(matches!(err, QueryError::Fetch(FetchError::QueryError(_))));
    }
}
