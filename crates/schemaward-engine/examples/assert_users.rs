//! Declare the users and posts tables and assert them against a database
//!
//! Runs against an in-memory source by default. With `--features postgres`
//! and `PGHOST` set, the tables are checked against a live server instead:
//!
//! ```text
//! RUST_LOG=debug PGHOST=localhost PGUSER=postgres \
//!     cargo run -p schemaward-engine --example assert_users --features postgres
//! ```

use schemaward_catalog::{MetadataSource, MockSource, PostgresSource};
use schemaward_core::{column, integer, text, Config, Table};
use schemaward_engine::{assert_schema, AssertError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn declare() -> Result<Vec<Table>, Box<dyn std::error::Error>> {
    let users = Table::builder("users")
        .column("id", column(integer()))
        .column("name", column(text()))
        .column("desc", column(text().null()).named("description"))
        .build()?;

    let posts = Table::builder("posts")
        .column("id", column(integer()))
        .column("post", column(text()))
        .column("owner", column(integer()))
        .build()?;

    Ok(vec![users, posts])
}

async fn connect() -> Result<Box<dyn MetadataSource>, Box<dyn std::error::Error>> {
    if std::env::var("PGHOST").is_ok() {
        let config = Config::from_env()?;
        let source = PostgresSource::from_config(&config).await?;
        source.test_connection().await?;
        return Ok(Box::new(source));
    }

    // users lacks `description`, posts does not exist
    let source = MockSource::builder()
        .with_column("users", "id", "integer", false)
        .with_column("users", "name", "character varying", false)
        .build();
    Ok(Box::new(source))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let tables = declare()?;
    for table in &tables {
        println!("{}", table);
    }

    let source = connect().await?;
    tracing::info!(source = source.name(), "asserting schema");

    match assert_schema(source.as_ref(), &tables).await {
        Ok(()) => println!("Schema matches"),
        Err(AssertError::Schema(err)) => {
            println!("{}", err);
            for issue in err.issues() {
                println!("{}", serde_json::to_string(issue)?);
            }
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
