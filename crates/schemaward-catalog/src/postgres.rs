//! PostgreSQL metadata source using information_schema
//!
//! Table existence comes from `information_schema.tables` and column
//! metadata from `information_schema.columns`, both restricted to one
//! schema (namespace, `public` by default). Each call is a single query with
//! the candidate table names bound as a text array.
//!
//! ## Usage
//!
//! ```rust,ignore
//! // From a loaded configuration
//! let config = Config::from_env()?;
//! let source = PostgresSource::from_config(&config).await?;
//!
//! // Using a connection string
//! let source = PostgresSource::from_connection_string(
//!     "host=localhost port=5432 dbname=mydb user=postgres password=secret",
//!     "public",
//! ).await?;
//! ```
//!
//! Reference: https://www.postgresql.org/docs/current/information-schema-columns.html

use crate::adapter::{ColumnCatalog, FetchError, MetadataSource, RowSource};
use schemaward_core::{Column, Config, RawRow};
use std::collections::{BTreeSet, HashSet};

#[cfg(feature = "postgres")]
use crate::adapter::{ColumnMetadata, ColumnRow};

#[cfg(feature = "postgres")]
use schemaward_core::{PrimitiveType, Value};

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, NoTls, Config as PgConfig};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

#[cfg(feature = "postgres")]
const EXISTING_TABLES_QUERY: &str = r#"
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema::text = $1::text
      AND table_name::text = ANY($2::text[])
"#;

#[cfg(feature = "postgres")]
const COLUMNS_QUERY: &str = r#"
    SELECT
        table_name::text,
        column_name::text,
        data_type::text,
        is_nullable::text
    FROM information_schema.columns
    WHERE table_schema::text = $1::text
      AND table_name::text = ANY($2::text[])
    ORDER BY table_name, ordinal_position
"#;

#[cfg(not(feature = "postgres"))]
fn disabled() -> FetchError {
    FetchError::ConfigError(
        "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
    )
}

/// PostgreSQL metadata source
pub struct PostgresSource {
    /// PostgreSQL client (only available with postgres feature)
    #[cfg(feature = "postgres")]
    client: Client,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,

    /// Schema (namespace) that is introspected
    schema: String,
}

impl PostgresSource {
    /// Connect using a loaded [`Config`]
    ///
    /// Uses TLS when `config.tls` is set.
    pub async fn from_config(config: &Config) -> Result<Self, FetchError> {
        let conn_str = config.connection.connection_string();
        if config.tls {
            Self::from_connection_string_with_tls(&conn_str, &config.schema).await
        } else {
            Self::from_connection_string(&conn_str, &config.schema).await
        }
    }

    /// Connect from a PostgreSQL connection string
    ///
    /// Supports the standard key/value format:
    /// `host=localhost port=5432 dbname=mydb user=postgres password=secret`
    #[cfg(feature = "postgres")]
    pub async fn from_connection_string(conn_str: &str, schema: &str) -> Result<Self, FetchError> {
        let (host, port, database) = Self::describe(conn_str)?;

        let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
            .await
            .map_err(|e| FetchError::AuthenticationError(format!(
                "Failed to connect to PostgreSQL at {}:{}: {}",
                host, port, e
            )))?;

        Self::spawn_connection(connection, host.clone(), port);

        Ok(Self {
            client,
            host,
            port,
            database,
            schema: schema.to_string(),
        })
    }

    #[cfg(not(feature = "postgres"))]
    pub async fn from_connection_string(_conn_str: &str, _schema: &str) -> Result<Self, FetchError> {
        Err(disabled())
    }

    /// Connect from a PostgreSQL connection string over TLS
    ///
    /// The `sslmode` setting is ignored; TLS is always used.
    #[cfg(feature = "postgres")]
    pub async fn from_connection_string_with_tls(
        conn_str: &str,
        schema: &str,
    ) -> Result<Self, FetchError> {
        let (host, port, database) = Self::describe(conn_str)?;

        let connector = TlsConnector::builder()
            .build()
            .map_err(|e| FetchError::ConfigError(format!(
                "Failed to create TLS connector: {}", e
            )))?;

        let tls = MakeTlsConnector::new(connector);

        let (client, connection) = tokio_postgres::connect(conn_str, tls)
            .await
            .map_err(|e| FetchError::AuthenticationError(format!(
                "Failed to connect to PostgreSQL at {}:{} with TLS: {}",
                host, port, e
            )))?;

        Self::spawn_connection(connection, host.clone(), port);

        Ok(Self {
            client,
            host,
            port,
            database,
            schema: schema.to_string(),
        })
    }

    #[cfg(not(feature = "postgres"))]
    pub async fn from_connection_string_with_tls(
        _conn_str: &str,
        _schema: &str,
    ) -> Result<Self, FetchError> {
        Err(disabled())
    }

    /// Extract host, port and database for logging
    #[cfg(feature = "postgres")]
    fn describe(conn_str: &str) -> Result<(String, u16, String), FetchError> {
        let config: PgConfig = conn_str.parse()
            .map_err(|e| FetchError::ConfigError(format!(
                "Invalid connection string: {}", e
            )))?;

        let host = config.get_hosts()
            .first()
            .map(|h| match h {
                tokio_postgres::config::Host::Tcp(name) => name.clone(),
                #[cfg(unix)]
                tokio_postgres::config::Host::Unix(path) => path.display().to_string(),
            })
            .unwrap_or_else(|| "localhost".to_string());
        let port = config.get_ports()
            .first()
            .copied()
            .unwrap_or(5432);
        let database = config.get_dbname()
            .unwrap_or("postgres")
            .to_string();

        Ok((host, port, database))
    }

    /// Drive the connection in the background
    #[cfg(feature = "postgres")]
    fn spawn_connection<F>(connection: F, host: String, port: u16)
    where
        F: std::future::Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(%host, port, error = %e, "PostgreSQL connection error");
            }
        });
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Get the introspected schema
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Parse `information_schema` `is_nullable` values
    pub fn parse_is_nullable(value: &str) -> Result<bool, FetchError> {
        match value.to_uppercase().as_str() {
            "YES" => Ok(true),
            "NO" => Ok(false),
            other => Err(FetchError::InvalidResponse(format!(
                "Unexpected is_nullable value '{}'",
                other
            ))),
        }
    }
}

#[cfg(feature = "postgres")]
fn map_query_error(e: tokio_postgres::Error) -> FetchError {
    if e.is_closed() {
        return FetchError::NetworkError(e.to_string());
    }
    let err_str = e.to_string();
    if err_str.contains("permission denied") {
        FetchError::PermissionDenied(err_str)
    } else {
        FetchError::QueryError(err_str)
    }
}

#[cfg(feature = "postgres")]
fn read_value(
    row: &tokio_postgres::Row,
    idx: usize,
    primitive: PrimitiveType,
) -> Result<Value, tokio_postgres::Error> {
    let value = match primitive {
        PrimitiveType::Integer => row.try_get::<_, Option<i32>>(idx)?.map(Value::Integer),
        PrimitiveType::BigInt => row.try_get::<_, Option<i64>>(idx)?.map(Value::BigInt),
        PrimitiveType::Text => row.try_get::<_, Option<String>>(idx)?.map(Value::Text),
        PrimitiveType::Boolean => row.try_get::<_, Option<bool>>(idx)?.map(Value::Boolean),
    };
    Ok(value.unwrap_or(Value::Null))
}

#[async_trait::async_trait]
impl MetadataSource for PostgresSource {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    #[cfg(feature = "postgres")]
    async fn list_existing_tables(
        &self,
        candidates: &BTreeSet<String>,
    ) -> Result<HashSet<String>, FetchError> {
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }

        let names: Vec<&str> = candidates.iter().map(String::as_str).collect();
        tracing::debug!(schema = %self.schema, tables = names.len(), "querying information_schema.tables");

        let rows = self.client
            .query(EXISTING_TABLES_QUERY, &[&self.schema, &names])
            .await
            .map_err(map_query_error)?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<HashSet<_>, _>>()
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    #[cfg(not(feature = "postgres"))]
    async fn list_existing_tables(
        &self,
        _candidates: &BTreeSet<String>,
    ) -> Result<HashSet<String>, FetchError> {
        Err(disabled())
    }

    #[cfg(feature = "postgres")]
    async fn list_columns(&self, tables: &BTreeSet<String>) -> Result<ColumnCatalog, FetchError> {
        if tables.is_empty() {
            return Ok(ColumnCatalog::new());
        }

        let names: Vec<&str> = tables.iter().map(String::as_str).collect();
        tracing::debug!(schema = %self.schema, tables = names.len(), "querying information_schema.columns");

        let rows = self.client
            .query(COLUMNS_QUERY, &[&self.schema, &names])
            .await
            .map_err(map_query_error)?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let table: String = row.try_get(0)
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
            let column: String = row.try_get(1)
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
            let data_type: String = row.try_get(2)
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
            let is_nullable: String = row.try_get(3)
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

            columns.push(ColumnRow {
                table,
                column,
                metadata: ColumnMetadata::new(data_type, Self::parse_is_nullable(&is_nullable)?),
            });
        }

        Ok(ColumnCatalog::from_rows(columns))
    }

    #[cfg(not(feature = "postgres"))]
    async fn list_columns(&self, _tables: &BTreeSet<String>) -> Result<ColumnCatalog, FetchError> {
        Err(disabled())
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self) -> Result<(), FetchError> {
        self.client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| FetchError::QueryError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self) -> Result<(), FetchError> {
        Err(disabled())
    }
}

#[async_trait::async_trait]
impl RowSource for PostgresSource {
    #[cfg(feature = "postgres")]
    async fn fetch_rows(&self, sql: &str, columns: &[Column]) -> Result<Vec<RawRow>, FetchError> {
        let rows = self.client
            .query(sql, &[])
            .await
            .map_err(map_query_error)?;

        let mut raw_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut raw = RawRow::new();
            for column in columns {
                let Some(idx) = row.columns().iter().position(|c| c.name() == column.name()) else {
                    continue;
                };
                let value = read_value(row, idx, column.data_type().primitive_of())
                    .map_err(|e| FetchError::InvalidResponse(format!(
                        "Cannot read column '{}': {}",
                        column.name(), e
                    )))?;
                raw.insert(column.name().to_string(), value);
            }
            raw_rows.push(raw);
        }

        Ok(raw_rows)
    }

    #[cfg(not(feature = "postgres"))]
    async fn fetch_rows(&self, _sql: &str, _columns: &[Column]) -> Result<Vec<RawRow>, FetchError> {
        Err(disabled())
    }
}
