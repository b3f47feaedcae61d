//! Thin query wrappers, one module per table.
//!
//! Every read excludes soft-deleted rows and rows owned by soft-deleted users.

pub mod comment;
pub mod like;
pub mod post;
pub mod relation;
pub mod user;

use sqlx::postgres::PgPoolOptions;

use crate::{config::DatabaseConfig, Database};

/// SQLSTATE raised by Postgres when a unique constraint or index is violated.
pub const UNIQUE_VIOLATION: &str = "23505";

pub async fn connect(config: &DatabaseConfig) -> Result<Database, sqlx::Error> {
	PgPoolOptions::new()
		.max_connections(config.max_connections)
		.min_connections(config.min_connections)
		.max_lifetime(config.max_lifetime)
		.connect(&config.url)
		.await
}

/// Returns the name of the violated constraint if `error` is a unique violation.
///
/// The name is empty when Postgres did not report one.
pub fn unique_violation(error: &sqlx::Error) -> Option<&str> {
	match error {
		sqlx::Error::Database(e) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
			Some(e.constraint().unwrap_or_default())
		}
		_ => None,
	}
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
	unique_violation(error).is_some()
}
