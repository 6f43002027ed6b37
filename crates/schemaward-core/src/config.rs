//! Connection configuration (schemaward.toml)

use serde::{Deserialize, Serialize};

/// Default namespace introspected by schema assertions
pub const DEFAULT_SCHEMA: &str = "public";

/// PostgreSQL connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server hostname or IP
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name
    #[serde(default = "default_database")]
    pub database: String,

    /// Username for authentication
    #[serde(default = "default_user")]
    pub user: String,

    /// Password for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "postgres".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            user: default_user(),
            password: None,
        }
    }
}

impl ConnectionConfig {
    /// Render a libpq key/value connection string
    ///
    /// Every value is single-quoted with `\\` and `'` backslash-escaped, so
    /// passwords may contain spaces or quotes and may be empty.
    pub fn connection_string(&self) -> String {
        let mut conn = format!(
            "host={} port={} dbname={} user={}",
            quote(&self.host),
            self.port,
            quote(&self.database),
            quote(&self.user)
        );
        if let Some(password) = &self.password {
            conn.push_str(&format!(" password={}", quote(password)));
        }
        conn
    }
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Schema (namespace) whose tables are checked
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Connect over TLS
    #[serde(default)]
    pub tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            schema: default_schema(),
            tls: false,
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load config from the environment
    ///
    /// Reads a `.env` file if one exists, then the standard `PG*` variables
    /// plus `SCHEMAWARD_SCHEMA` and `SCHEMAWARD_TLS`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("PGHOST") {
            config.connection.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            config.connection.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PGPORT", value: port })?;
        }
        if let Some(database) = lookup("PGDATABASE") {
            config.connection.database = database;
        }
        if let Some(user) = lookup("PGUSER") {
            config.connection.user = user;
        }
        config.connection.password = lookup("PGPASSWORD");
        if let Some(schema) = lookup("SCHEMAWARD_SCHEMA") {
            config.schema = schema;
        }
        if let Some(tls) = lookup("SCHEMAWARD_TLS") {
            config.tls = match tls.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(ConfigError::InvalidValue { key: "SCHEMAWARD_TLS", value: tls }),
            };
        }

        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}
