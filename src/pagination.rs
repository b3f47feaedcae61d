//! Keyset pagination over `(created_at, id)`, newest first.
//!
//! Pages never use offsets, so rows inserted while a client is paging do not
//! shift the pages it has yet to fetch. A page shorter than the requested
//! count marks the end of the stream.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;
use validator::ValidationError;

pub const DEFAULT_COUNT: i64 = 20;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
pub fn default_count() -> i64 {
	DEFAULT_COUNT
}

/// The last row a client has seen.
///
/// With an id, the bound is the compound `(created_at, id)` so rows sharing
/// a timestamp are neither skipped nor repeated. Without one, everything
/// strictly older than `created_at` is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
	pub created_at: DateTime<Utc>,
	pub id: Option<Uuid>,
}

impl Cursor {
	/// Builds a cursor, defaulting the timestamp to now.
	pub fn new(created_at: Option<DateTime<Utc>>, id: Option<Uuid>) -> Self {
		Self {
			created_at: created_at.unwrap_or_else(Utc::now),
			id,
		}
	}

	/// Appends `AND <bound>` against `{table}.created_at` and `{table}.id`.
	pub fn push_bound(&self, query: &mut QueryBuilder<'_, Postgres>, table: &str) {
		match self.id {
			Some(id) => {
				query
					.push(format!(" AND ({table}.created_at, {table}.id) < ("))
					.push_bind(self.created_at)
					.push(", ")
					.push_bind(id)
					.push(")");
			}
			None => {
				query
					.push(format!(" AND {table}.created_at < "))
					.push_bind(self.created_at);
			}
		}
	}
}

/// Appends the newest-first ordering and the page size.
pub fn push_order(query: &mut QueryBuilder<'_, Postgres>, table: &str, count: i64) {
	query
		.push(format!(
			" ORDER BY {table}.created_at DESC, {table}.id DESC LIMIT "
		))
		.push_bind(count);
}

/// A cursor id only makes sense next to the timestamp it was read with.
pub fn validate_cursor(
	created_at: Option<DateTime<Utc>>,
	id: Option<Uuid>,
) -> Result<(), ValidationError> {
	if id.is_some() && created_at.is_none() {
		let mut error = ValidationError::new("cursor_incomplete");
		error.message = Some("a last seen id requires its created_at timestamp".into());

		return Err(error);
	}

	Ok(())
}
