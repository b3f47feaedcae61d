use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	pagination::{self, Cursor},
	visibility::PostFilter,
	Database,
};

/// A post row, with its like count and whether the viewer liked it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbPost {
	pub id: Uuid,
	pub user_id: Uuid,
	/// Path of the uploaded media, as returned by the upload route.
	pub content: String,
	pub description: String,
	pub created_at: DateTime<Utc>,
	pub likes: i64,
	pub liked: bool,
}

/// Starts a post query as seen by `viewer`, aliasing `post` as `p`.
///
/// The statement ends in an open `WHERE` clause so conditions can be
/// appended with `AND`.
fn select(viewer: Uuid) -> QueryBuilder<'static, Postgres> {
	let mut query = QueryBuilder::new(
		r#"
			SELECT p.*,
				(SELECT count(*) FROM post_like l WHERE l.post_id = p.id) AS likes,
				EXISTS (SELECT 1 FROM post_like l WHERE l.post_id = p.id AND l.user_id = "#,
	);

	query.push_bind(viewer).push(
		r#") AS liked
			FROM post p
			JOIN "user" u ON u.id = p.user_id AND u.deleted_at IS NULL
			WHERE p.deleted_at IS NULL"#,
	);

	query
}

pub async fn list(
	database: &Database,
	viewer: Uuid,
	filter: &PostFilter,
	cursor: Cursor,
	count: i64,
) -> Result<Vec<DbPost>, sqlx::Error> {
	if filter.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = select(viewer);

	filter.push_condition(&mut query, "p");
	cursor.push_bound(&mut query, "p");
	pagination::push_order(&mut query, "p", count);

	query
		.build_query_as::<DbPost>()
		.fetch_all(database)
		.await
}

pub async fn count(database: &Database, filter: &PostFilter) -> Result<i64, sqlx::Error> {
	if filter.is_empty() {
		return Ok(0);
	}

	let mut query = QueryBuilder::<Postgres>::new(
		r#"
			SELECT count(*) FROM post p
			JOIN "user" u ON u.id = p.user_id AND u.deleted_at IS NULL
			WHERE p.deleted_at IS NULL"#,
	);

	filter.push_condition(&mut query, "p");

	query
		.build_query_scalar::<i64>()
		.fetch_one(database)
		.await
}

pub async fn find(database: &Database, viewer: Uuid, id: Uuid) -> Result<Option<DbPost>, sqlx::Error> {
	let mut query = select(viewer);

	query.push(" AND p.id = ").push_bind(id);

	query
		.build_query_as::<DbPost>()
		.fetch_optional(database)
		.await
}

pub async fn insert(
	database: &Database,
	user_id: Uuid,
	content: &str,
	description: &str,
) -> Result<DbPost, sqlx::Error> {
	sqlx::query_as::<_, DbPost>(
		r#"
			INSERT INTO post (id, user_id, content, description)
			VALUES ($1, $2, $3, $4)
			RETURNING *, 0::BIGINT AS likes, FALSE AS liked
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.bind(content)
	.bind(description)
	.fetch_one(database)
	.await
}

pub async fn update_description(
	database: &Database,
	id: Uuid,
	description: &str,
) -> Result<u64, sqlx::Error> {
	sqlx::query("UPDATE post SET description = $1 WHERE id = $2 AND deleted_at IS NULL")
		.bind(description)
		.bind(id)
		.execute(database)
		.await
		.map(|result| result.rows_affected())
}

pub async fn soft_delete(database: &Database, id: Uuid) -> Result<u64, sqlx::Error> {
	sqlx::query("UPDATE post SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
		.bind(id)
		.execute(database)
		.await
		.map(|result| result.rows_affected())
}
