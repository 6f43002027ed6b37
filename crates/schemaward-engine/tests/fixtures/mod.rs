//! Shared table declarations for engine integration tests

use schemaward_catalog::{MockSource, MockSourceBuilder};
use schemaward_core::{column, integer, text, Table};

pub fn users() -> Table {
    Table::builder("users")
        .column("id", column(integer()))
        .column("name", column(text()))
        .column("desc", column(text().null()).named("description"))
        .build()
        .unwrap()
}

pub fn posts() -> Table {
    Table::builder("posts")
        .column("id", column(integer()))
        .column("post", column(text()))
        .column("owner", column(integer()))
        .build()
        .unwrap()
}

/// Live layout of `users` with every declared column present
pub fn with_users(builder: MockSourceBuilder) -> MockSourceBuilder {
    builder
        .with_column("users", "id", "integer", false)
        .with_column("users", "name", "character varying", false)
        .with_column("users", "description", "text", true)
}

pub fn with_posts(builder: MockSourceBuilder) -> MockSourceBuilder {
    builder
        .with_column("posts", "id", "integer", false)
        .with_column("posts", "post", "text", false)
        .with_column("posts", "owner", "integer", false)
}

pub fn blog_source() -> MockSource {
    with_posts(with_users(MockSource::builder())).build()
}
