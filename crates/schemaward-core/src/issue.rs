//! Schema discrepancies and the aggregate assertion error

use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrepancy between a declared table and the live database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Issue {
    /// The table does not exist
    MissingTable { table: String },

    /// The table exists but the column does not
    MissingColumn { table: String, column: String },

    /// The column exists with an incompatible type or nullability
    WrongDataType { table: String, column: String },
}

impl Issue {
    pub fn missing_table(table: impl Into<String>) -> Self {
        Self::MissingTable { table: table.into() }
    }

    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn wrong_data_type(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::WrongDataType {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Table the issue refers to
    pub fn table(&self) -> &str {
        match self {
            Self::MissingTable { table }
            | Self::MissingColumn { table, .. }
            | Self::WrongDataType { table, .. } => table.as_str(),
        }
    }

    /// Column the issue refers to, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::MissingTable { .. } => None,
            Self::MissingColumn { column, .. } | Self::WrongDataType { column, .. } => {
                Some(column.as_str())
            }
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTable { table } => write!(f, "table '{}' is missing", table),
            Self::MissingColumn { table, column } => {
                write!(f, "column '{}' is missing from table '{}'", column, table)
            }
            Self::WrongDataType { table, column } => {
                write!(f, "column '{}' in table '{}' has a different datatype", column, table)
            }
        }
    }
}

/// Every issue found by one schema assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Schema assertion failed:{}", render(.issues))]
pub struct SchemaAssertionError {
    issues: Vec<Issue>,
}

impl SchemaAssertionError {
    /// Wrap a list of issues, or return `None` when there is nothing to report
    pub fn from_issues(issues: Vec<Issue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// One `\n\t- <issue>` line per issue
fn render(issues: &[Issue]) -> String {
    issues.iter().map(|issue| format!("\n\t- {}", issue)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_messages() {
        assert_eq!(Issue::missing_table("posts").to_string(), "table 'posts' is missing");
        assert_eq!(
            Issue::missing_column("users", "desc").to_string(),
            "column 'desc' is missing from table 'users'"
        );
        assert_eq!(
            Issue::wrong_data_type("users", "id").to_string(),
            "column 'id' in table 'users' has a different datatype"
        );
    }

    #[test]
    fn accessors() {
        let issue = Issue::wrong_data_type("users", "id");
        assert_eq!(issue.table(), "users");
        assert_eq!(issue.column(), Some("id"));
        assert_eq!(Issue::missing_table("posts").column(), None);
    }

    #[test]
    fn aggregate_message_lists_every_issue() {
        let err = SchemaAssertionError::from_issues(vec![
            Issue::missing_table("posts"),
            Issue::missing_column("users", "desc"),
        ])
        .unwrap();

        assert_eq!(
            err.to_string(),
            "Schema assertion failed:\n\t- table 'posts' is missing\n\t- column 'desc' is missing from table 'users'"
        );
        assert_eq!(err.issues().len(), 2);

        let boxed: Box<dyn std::error::Error> = Box::new(err.clone());
        assert_eq!(boxed.to_string(), err.to_string());
        assert!(boxed.source().is_none());
    }

    #[test]
    fn no_issues_no_error() {
        assert!(SchemaAssertionError::from_issues(Vec::new()).is_none());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Issue::missing_column("users", "desc")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "missing_column", "table": "users", "column": "desc" })
        );
    }
}
