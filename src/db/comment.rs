use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	pagination::{self, Cursor},
	Database,
};

/// A comment row, with its like count and whether the viewer liked it.
///
/// Comments of deleted posts are never loaded.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbComment {
	pub id: Uuid,
	pub post_id: Uuid,
	pub user_id: Uuid,
	pub content: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub likes: i64,
	pub liked: bool,
}

fn select(viewer: Uuid) -> QueryBuilder<'static, Postgres> {
	let mut query = QueryBuilder::new(
		r#"
			SELECT c.*,
				(SELECT count(*) FROM comment_like l WHERE l.comment_id = c.id) AS likes,
				EXISTS (SELECT 1 FROM comment_like l WHERE l.comment_id = c.id AND l.user_id = "#,
	);

	query.push_bind(viewer).push(
		r#") AS liked
			FROM comment c
			JOIN post p ON p.id = c.post_id AND p.deleted_at IS NULL
			JOIN "user" u ON u.id = c.user_id AND u.deleted_at IS NULL
			WHERE c.deleted_at IS NULL"#,
	);

	query
}

pub async fn list(
	database: &Database,
	viewer: Uuid,
	post_id: Uuid,
	cursor: Cursor,
	count: i64,
) -> Result<Vec<DbComment>, sqlx::Error> {
	let mut query = select(viewer);

	query.push(" AND c.post_id = ").push_bind(post_id);
	cursor.push_bound(&mut query, "c");
	pagination::push_order(&mut query, "c", count);

	query
		.build_query_as::<DbComment>()
		.fetch_all(database)
		.await
}

/// The newest `per_post` comments of each listed post, newest first.
pub async fn preview(
	database: &Database,
	viewer: Uuid,
	post_ids: &[Uuid],
	per_post: i64,
) -> Result<Vec<DbComment>, sqlx::Error> {
	if post_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM (");

	query.push(
		r#"
			SELECT c.*,
				(SELECT count(*) FROM comment_like l WHERE l.comment_id = c.id) AS likes,
				EXISTS (SELECT 1 FROM comment_like l WHERE l.comment_id = c.id AND l.user_id = "#,
	);

	query
		.push_bind(viewer)
		.push(
			r#") AS liked,
				row_number() OVER (PARTITION BY c.post_id ORDER BY c.created_at DESC, c.id DESC) AS rank
			FROM comment c
			JOIN "user" u ON u.id = c.user_id AND u.deleted_at IS NULL
			WHERE c.deleted_at IS NULL AND c.post_id = ANY("#,
		)
		.push_bind(post_ids.to_vec())
		.push(")) ranked WHERE rank <= ")
		.push_bind(per_post)
		.push(" ORDER BY created_at DESC, id DESC");

	query
		.build_query_as::<DbComment>()
		.fetch_all(database)
		.await
}

pub async fn count(database: &Database, post_id: Uuid) -> Result<i64, sqlx::Error> {
	sqlx::query_scalar::<_, i64>(
		r#"
			SELECT count(*) FROM comment c
			JOIN post p ON p.id = c.post_id AND p.deleted_at IS NULL
			JOIN "user" u ON u.id = c.user_id AND u.deleted_at IS NULL
			WHERE c.post_id = $1 AND c.deleted_at IS NULL
		"#,
	)
	.bind(post_id)
	.fetch_one(database)
	.await
}

/// Finds a comment, only if it belongs to `post_id`.
pub async fn find(
	database: &Database,
	viewer: Uuid,
	post_id: Uuid,
	id: Uuid,
) -> Result<Option<DbComment>, sqlx::Error> {
	let mut query = select(viewer);

	query
		.push(" AND c.post_id = ")
		.push_bind(post_id)
		.push(" AND c.id = ")
		.push_bind(id);

	query
		.build_query_as::<DbComment>()
		.fetch_optional(database)
		.await
}

pub async fn insert(
	database: &Database,
	post_id: Uuid,
	user_id: Uuid,
	content: &str,
) -> Result<DbComment, sqlx::Error> {
	sqlx::query_as::<_, DbComment>(
		r#"
			INSERT INTO comment (id, post_id, user_id, content)
			VALUES ($1, $2, $3, $4)
			RETURNING *, 0::BIGINT AS likes, FALSE AS liked
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(post_id)
	.bind(user_id)
	.bind(content)
	.fetch_one(database)
	.await
}

pub async fn update_content(database: &Database, id: Uuid, content: &str) -> Result<u64, sqlx::Error> {
	sqlx::query(
		"UPDATE comment SET content = $1, updated_at = now() WHERE id = $2 AND deleted_at IS NULL",
	)
	.bind(content)
	.bind(id)
	.execute(database)
	.await
	.map(|result| result.rows_affected())
}

pub async fn soft_delete(database: &Database, id: Uuid) -> Result<u64, sqlx::Error> {
	sqlx::query("UPDATE comment SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
		.bind(id)
		.execute(database)
		.await
		.map(|result| result.rows_affected())
}
