//! Table and column declarations
//!
//! Columns start out as [`ColumnDef`] values with an optional override name.
//! [`TableBuilder::build`] resolves every name in one step and returns an
//! immutable [`Table`]; resolved [`Column`]s never exist outside a table.

use crate::row::RowShape;
use crate::types::DeclaredType;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Column declaration before name resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    data_type: DeclaredType,
    name: Option<String>,
}

impl ColumnDef {
    pub fn new(data_type: impl Into<DeclaredType>) -> Self {
        Self {
            data_type: data_type.into(),
            name: None,
        }
    }

    /// Use `name` for the database column instead of the declaration key
    ///
    /// An empty name is treated as no override.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// Whether an override name was supplied
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn data_type(&self) -> DeclaredType {
        self.data_type
    }
}

/// Shorthand for [`ColumnDef::new`]
pub fn column(data_type: impl Into<DeclaredType>) -> ColumnDef {
    ColumnDef::new(data_type)
}

/// A column with its database name resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Column {
    key: String,
    name: String,
    data_type: DeclaredType,
}

impl Column {
    /// Declaration key the column was registered under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Name of the column in the database
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DeclaredType {
        self.data_type
    }
}

/// Errors raised while building a table declaration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Table name must not be empty")]
    EmptyTableName,

    #[error("Column key must not be empty in table '{table}'")]
    EmptyColumnKey { table: String },

    #[error("Column key '{key}' is declared twice in table '{table}'")]
    DuplicateColumnKey { table: String, key: String },

    #[error("Column name '{name}' is used by more than one column in table '{table}'")]
    DuplicateColumnName { table: String, name: String },
}

/// Builder collecting column declarations in order
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    columns: Vec<(String, ColumnDef)>,
}

impl TableBuilder {
    /// Append a column under `key`
    pub fn column(mut self, key: impl Into<String>, def: ColumnDef) -> Self {
        self.columns.push((key.into(), def));
        self
    }

    /// Resolve column names and freeze the table
    pub fn build(self) -> Result<Table, SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyTableName);
        }

        let mut keys = HashSet::new();
        let mut names = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());

        for (key, def) in self.columns {
            if key.is_empty() {
                return Err(SchemaError::EmptyColumnKey { table: self.name });
            }
            if !keys.insert(key.clone()) {
                return Err(SchemaError::DuplicateColumnKey { table: self.name, key });
            }

            let name = def.name.unwrap_or_else(|| key.clone());
            if !names.insert(name.clone()) {
                return Err(SchemaError::DuplicateColumnName { table: self.name, name });
            }

            columns.push(Column {
                key,
                name,
                data_type: def.data_type,
            });
        }

        let shape = RowShape::for_columns(&columns);

        Ok(Table {
            name: self.name,
            columns,
            shape,
        })
    }
}

/// Immutable declaration of an expected database table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    #[serde(skip)]
    shape: RowShape,
}

impl Table {
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Find a column by declaration key
    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Resolved database column names, in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Shape of rows returned by queries against this table
    pub fn row_shape(&self) -> &RowShape {
        &self.shape
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table ({}):", self.name)?;
        for column in &self.columns {
            write!(f, "\n  {}: {}", column.name, column.data_type)?;
        }
        Ok(())
    }
}
