//! Schema comparator for checking declared tables against a live database
//!
//! The comparison runs in two phases, each a single introspection query:
//!
//! 1. Table existence. Every declared table missing from the database
//!    produces [`Issue::MissingTable`] and is excluded from phase 2.
//! 2. Column comparison for the tables that exist. Each declared column is
//!    looked up by its resolved name and checked for nullability, then type
//!    compatibility.
//!
//! Phase 1 issues come first, then phase 2 issues; within each phase issues
//! follow table declaration order, then column declaration order.

use crate::error::AssertError;
use schemaward_catalog::{ColumnCatalog, ColumnMetadata, FetchError, MetadataSource};
use schemaward_core::{Column, Issue, SchemaAssertionError, Table};
use std::collections::{BTreeSet, HashSet};

/// Compare declared tables against the database and collect every issue
///
/// Any introspection failure aborts the comparison; partial results are
/// never returned.
pub async fn collect_issues<S>(source: &S, tables: &[Table]) -> Result<Vec<Issue>, FetchError>
where
    S: MetadataSource + ?Sized,
{
    if tables.is_empty() {
        tracing::debug!("no tables declared, skipping introspection");
        return Ok(Vec::new());
    }

    warn_duplicate_names(tables);

    let candidates: BTreeSet<String> = tables.iter().map(|t| t.name().to_string()).collect();
    tracing::debug!(source = source.name(), tables = candidates.len(), "checking table existence");

    let reported = source.list_existing_tables(&candidates).await?;
    let existing: BTreeSet<String> = candidates
        .into_iter()
        .filter(|name| reported.contains(name))
        .collect();

    let mut issues: Vec<Issue> = tables
        .iter()
        .filter(|table| !existing.contains(table.name()))
        .map(|table| Issue::missing_table(table.name()))
        .collect();

    if existing.is_empty() {
        tracing::debug!("no declared table exists, skipping column comparison");
        return Ok(issues);
    }

    tracing::debug!(source = source.name(), tables = existing.len(), "fetching column metadata");
    let catalog = source.list_columns(&existing).await?;

    for table in tables.iter().filter(|table| existing.contains(table.name())) {
        issues.extend(compare_table(table, &catalog));
    }

    Ok(issues)
}

/// Assert that every declared table matches the database
///
/// Succeeds silently when no issues are found. Otherwise fails with
/// [`AssertError::Schema`] carrying every issue in one report.
pub async fn assert_schema<S>(source: &S, tables: &[Table]) -> Result<(), AssertError>
where
    S: MetadataSource + ?Sized,
{
    let issues = collect_issues(source, tables).await?;

    match SchemaAssertionError::from_issues(issues) {
        None => {
            tracing::info!(tables = tables.len(), "schema assertion passed");
            Ok(())
        }
        Some(err) => {
            tracing::info!(issues = err.issues().len(), "schema assertion failed");
            Err(err.into())
        }
    }
}

/// Compare the columns of one existing table against its metadata
pub fn compare_table(table: &Table, catalog: &ColumnCatalog) -> Vec<Issue> {
    table
        .columns()
        .iter()
        .filter_map(|column| {
            check_column(table.name(), column, catalog.column(table.name(), column.name()))
        })
        .collect()
}

/// Check a single declared column against what the database reports
///
/// A live nullable column declared as non-nullable is a mismatch. The
/// reverse (declared nullable, live NOT NULL) is accepted.
pub fn check_column(
    table: &str,
    column: &Column,
    reported: Option<&ColumnMetadata>,
) -> Option<Issue> {
    let Some(reported) = reported else {
        return Some(Issue::missing_column(table, column.name()));
    };

    let declared = column.data_type();
    if reported.nullable && !declared.is_null() {
        return Some(Issue::wrong_data_type(table, column.name()));
    }
    if !declared.primitive_of().is_compatible(&reported.reported_type) {
        return Some(Issue::wrong_data_type(table, column.name()));
    }

    None
}

fn warn_duplicate_names(tables: &[Table]) {
    let mut seen = HashSet::new();
    for table in tables {
        if !seen.insert(table.name()) {
            tracing::warn!(table = table.name(), "table declared more than once");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemaward_catalog::MockSource;
    use schemaward_core::{bigint, column, integer, text};

    fn users() -> Table {
        Table::builder("users")
            .column("id", column(integer()))
            .column("name", column(text()))
            .column("desc", column(text().null()))
            .build()
            .unwrap()
    }

    fn posts() -> Table {
        Table::builder("posts")
            .column("id", column(integer()))
            .column("post", column(text()))
            .column("owner", column(integer()))
            .build()
            .unwrap()
    }

    fn single(table: &Table, column_key: &str, reported: Option<ColumnMetadata>) -> Option<Issue> {
        let column = table.column(column_key).unwrap();
        check_column(table.name(), column, reported.as_ref())
    }

    #[test]
    fn test_check_column_match() {
        let table = users();
        assert_eq!(single(&table, "id", Some(ColumnMetadata::new("integer", false))), None);
        assert_eq!(
            single(&table, "name", Some(ColumnMetadata::new("character varying", false))),
            None
        );
    }

    #[test]
    fn test_check_column_missing() {
        assert_eq!(
            single(&users(), "desc", None),
            Some(Issue::missing_column("users", "desc"))
        );
    }

    #[test]
    fn test_live_nullable_declared_not_null() {
        assert_eq!(
            single(&users(), "id", Some(ColumnMetadata::new("integer", true))),
            Some(Issue::wrong_data_type("users", "id"))
        );
    }

    #[test]
    fn test_live_not_null_declared_nullable() {
        assert_eq!(single(&users(), "desc", Some(ColumnMetadata::new("text", false))), None);
    }

    #[test]
    fn test_incompatible_type() {
        assert_eq!(
            single(&users(), "id", Some(ColumnMetadata::new("text", false))),
            Some(Issue::wrong_data_type("users", "id"))
        );

        let wide = Table::builder("events")
            .column("id", column(bigint()))
            .build()
            .unwrap();
        assert_eq!(
            single(&wide, "id", Some(ColumnMetadata::new("integer", false))),
            Some(Issue::wrong_data_type("events", "id"))
        );
    }

    #[test]
    fn test_nullability_and_type_report_once() {
        // Both checks fail; only one issue is produced
        let issues = compare_table(&users(), &{
            let mut catalog = ColumnCatalog::new();
            catalog.insert("users", "id", ColumnMetadata::new("text", true));
            catalog.insert("users", "name", ColumnMetadata::new("text", false));
            catalog.insert("users", "desc", ColumnMetadata::new("text", true));
            catalog
        });

        assert_eq!(issues, vec![Issue::wrong_data_type("users", "id")]);
    }

    #[test]
    fn test_override_name_is_used_for_lookup() {
        let table = Table::builder("users")
            .column("desc", column(text().null()).named("description"))
            .build()
            .unwrap();

        let mut catalog = ColumnCatalog::new();
        catalog.insert("users", "description", ColumnMetadata::new("text", true));
        assert!(compare_table(&table, &catalog).is_empty());

        let mut catalog = ColumnCatalog::new();
        catalog.insert("users", "desc", ColumnMetadata::new("text", true));
        assert_eq!(
            compare_table(&table, &catalog),
            vec![Issue::missing_column("users", "description")]
        );
    }

    #[tokio::test]
    async fn test_scenario_missing_column() {
        let source = MockSource::builder()
            .with_column("users", "id", "integer", false)
            .with_column("users", "name", "text", false)
            .build();

        let issues = collect_issues(&source, &[users()]).await.unwrap();

        assert_eq!(issues, vec![Issue::missing_column("users", "desc")]);
    }

    #[tokio::test]
    async fn test_scenario_missing_table() {
        let source = MockSource::new();

        let err = assert_schema(&source, &[posts()]).await.unwrap_err();

        assert!(err.to_string().contains("table 'posts' is missing"));
        assert_eq!(err.issues(), &[Issue::missing_table("posts")]);
    }

    #[tokio::test]
    async fn test_scenario_all_match() {
        let source = MockSource::builder()
            .with_column("users", "id", "integer", false)
            .with_column("users", "name", "character varying", false)
            .with_column("users", "desc", "text", true)
            .build();

        assert!(assert_schema(&source, &[users()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_table_gets_no_column_issues() {
        let source = MockSource::builder()
            .with_column("users", "id", "integer", false)
            .with_column("users", "name", "text", false)
            .with_column("users", "desc", "text", true)
            .build();
        source.add_table("unrelated").await;

        let issues = collect_issues(&source, &[posts(), users()]).await.unwrap();

        assert_eq!(issues, vec![Issue::missing_table("posts")]);
    }

    #[tokio::test]
    async fn test_phase_one_issues_come_first() {
        let source = MockSource::builder()
            .with_column("users", "id", "integer", true)
            .with_column("users", "name", "text", false)
            .build();

        let comments = Table::builder("comments")
            .column("id", column(integer()))
            .build()
            .unwrap();

        let issues = collect_issues(&source, &[users(), posts(), comments])
            .await
            .unwrap();

        assert_eq!(
            issues,
            vec![
                Issue::missing_table("posts"),
                Issue::missing_table("comments"),
                Issue::wrong_data_type("users", "id"),
                Issue::missing_column("users", "desc"),
            ]
        );
    }

    #[tokio::test]
    async fn test_two_round_trips() {
        let source = MockSource::builder()
            .with_column("users", "id", "integer", false)
            .with_column("posts", "id", "integer", false)
            .build();

        collect_issues(&source, &[users(), posts()]).await.unwrap();

        assert_eq!(source.table_calls(), 1);
        assert_eq!(source.column_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_tables_no_queries() {
        let source = MockSource::new();

        assert!(assert_schema(&source, &[]).await.is_ok());
        assert_eq!(source.round_trips(), 0);
    }

    #[tokio::test]
    async fn test_no_existing_tables_skips_column_query() {
        let source = MockSource::new();

        let issues = collect_issues(&source, &[users(), posts()]).await.unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(source.table_calls(), 1);
        assert_eq!(source.column_calls(), 0);
    }

    #[tokio::test]
    async fn test_table_phase_failure_aborts() {
        let source = MockSource::builder()
            .with_tables_error(FetchError::NetworkError("connection reset".to_string()))
            .build();

        let err = assert_schema(&source, &[users()]).await.unwrap_err();

        assert!(matches!(err, AssertError::Introspection(FetchError::NetworkError(_))));
        assert!(err.issues().is_empty());
        assert_eq!(source.column_calls(), 0);
    }

    #[tokio::test]
    async fn test_column_phase_failure_discards_issues() {
        // posts is missing, so phase 1 alone would report an issue
        let source = MockSource::builder()
            .with_column("users", "id", "integer", false)
            .with_columns_error(FetchError::PermissionDenied("information_schema".to_string()))
            .build();

        let err = assert_schema(&source, &[users(), posts()]).await.unwrap_err();

        assert!(matches!(err, AssertError::Introspection(FetchError::PermissionDenied(_))));
        assert!(err.issues().is_empty());
    }

    #[tokio::test]
    async fn test_idempotent() {
        let source = MockSource::builder()
            .with_column("users", "id", "text", true)
            .with_column("users", "name", "integer", false)
            .build();
        let tables = [users(), posts()];

        let first = collect_issues(&source, &tables).await.unwrap();
        let second = collect_issues(&source, &tables).await.unwrap();

        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_duplicate_table_declarations_are_each_checked() {
        let source = MockSource::builder()
            .with_column("users", "id", "integer", false)
            .with_column("users", "name", "text", false)
            .build();

        let issues = collect_issues(&source, &[users(), users()]).await.unwrap();

        assert_eq!(
            issues,
            vec![
                Issue::missing_column("users", "desc"),
                Issue::missing_column("users", "desc"),
            ]
        );
        assert_eq!(source.round_trips(), 2);
    }
}
