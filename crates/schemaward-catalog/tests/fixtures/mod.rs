//! Test fixtures for metadata source integration tests
//!
//! Column layouts mirror what `information_schema.columns` reports for a
//! small blog database.

use schemaward_catalog::{MockSource, MockSourceBuilder};
use std::collections::BTreeSet;

/// `users(id integer not null, name text not null, description text null)`
pub fn with_users(builder: MockSourceBuilder) -> MockSourceBuilder {
    builder
        .with_column("users", "id", "integer", false)
        .with_column("users", "name", "text", false)
        .with_column("users", "description", "text", true)
}

/// `posts(id integer not null, post character varying not null, owner integer not null)`
pub fn with_posts(builder: MockSourceBuilder) -> MockSourceBuilder {
    builder
        .with_column("posts", "id", "integer", false)
        .with_column("posts", "post", "character varying", false)
        .with_column("posts", "owner", "integer", false)
}

/// Source holding both the users and posts tables
pub fn blog_source() -> MockSource {
    with_posts(with_users(MockSource::builder())).build()
}

pub fn names(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}
