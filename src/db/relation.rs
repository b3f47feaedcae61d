use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
	pagination::{self, Cursor},
	visibility::RelationKind,
	Database,
};

/// A stored relation: `user_id` is `relation_type` `relation_user_id`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbRelation {
	pub id: Uuid,
	pub user_id: Uuid,
	pub relation_user_id: Uuid,
	#[sqlx(try_from = "String")]
	pub relation_type: RelationKind,
	pub created_at: DateTime<Utc>,
}

/// Every row stored between `a` and `b`, in either direction.
pub async fn between(database: &Database, a: Uuid, b: Uuid) -> Result<Vec<DbRelation>, sqlx::Error> {
	sqlx::query_as::<_, DbRelation>(
		r#"
			SELECT * FROM user_relation
			WHERE (user_id = $1 AND relation_user_id = $2)
				OR (user_id = $2 AND relation_user_id = $1)
		"#,
	)
	.bind(a)
	.bind(b)
	.fetch_all(database)
	.await
}

/// The ids `user` relates to with `kind`, unbounded.
pub async fn counterparts(
	database: &Database,
	user: Uuid,
	kind: RelationKind,
) -> Result<Vec<Uuid>, sqlx::Error> {
	let (stored, side) = kind.storage();

	sqlx::query_scalar::<_, Uuid>(&format!(
		"SELECT {other} FROM user_relation WHERE {own} = $1 AND relation_type = $2",
		own = side.column(),
		other = side.other().column(),
	))
	.bind(user)
	.bind(stored.as_str())
	.fetch_all(database)
	.await
}

/// The ids with a block between them and `user`, whoever blocked whom.
pub async fn blocked_either(database: &Database, user: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
	sqlx::query_scalar::<_, Uuid>(
		r#"
			SELECT relation_user_id FROM user_relation
			WHERE user_id = $1 AND relation_type = 'blocked'
			UNION
			SELECT user_id FROM user_relation
			WHERE relation_user_id = $1 AND relation_type = 'blocked'
		"#,
	)
	.bind(user)
	.fetch_all(database)
	.await
}

/// Lists the relations of `kind` as seen from `user`.
///
/// Rows are returned from `user`'s side: `user_id` is always `user` and
/// `relation_type` is always `kind`, whichever way the row is stored.
pub async fn list(
	database: &Database,
	user: Uuid,
	kind: RelationKind,
	cursor: Cursor,
	count: i64,
) -> Result<Vec<DbRelation>, sqlx::Error> {
	let (stored, side) = kind.storage();
	let (own, other) = (side.column(), side.other().column());

	let mut query = QueryBuilder::<Postgres>::new(format!(
		"SELECT r.id, r.{own} AS user_id, r.{other} AS relation_user_id, "
	));

	query
		.push_bind(kind.as_str())
		.push(format!(
			r#" AS relation_type, r.created_at FROM user_relation r JOIN "user" u ON u.id = r.{other} AND u.deleted_at IS NULL WHERE r.{own} = "#
		))
		.push_bind(user)
		.push(" AND r.relation_type = ")
		.push_bind(stored.as_str());

	cursor.push_bound(&mut query, "r");
	pagination::push_order(&mut query, "r", count);

	query
		.build_query_as::<DbRelation>()
		.fetch_all(database)
		.await
}

pub async fn count(database: &Database, user: Uuid, kind: RelationKind) -> Result<i64, sqlx::Error> {
	let (stored, side) = kind.storage();

	sqlx::query_scalar::<_, i64>(&format!(
		r#"
			SELECT count(*) FROM user_relation r
			JOIN "user" u ON u.id = r.{other} AND u.deleted_at IS NULL
			WHERE r.{own} = $1 AND r.relation_type = $2
		"#,
		own = side.column(),
		other = side.other().column(),
	))
	.bind(user)
	.bind(stored.as_str())
	.fetch_one(database)
	.await
}

/// Stores `user` `kind` `relation_user`. `kind` must be a stored kind.
pub async fn insert(
	database: &Database,
	user: Uuid,
	relation_user: Uuid,
	kind: RelationKind,
) -> Result<DbRelation, sqlx::Error> {
	sqlx::query_as::<_, DbRelation>(
		r#"
			INSERT INTO user_relation (id, user_id, relation_user_id, relation_type)
			VALUES ($1, $2, $3, $4)
			RETURNING *
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(user)
	.bind(relation_user)
	.bind(kind.as_str())
	.fetch_one(database)
	.await
}

/// Removes `user` `kind` `relation_user`, flipping follower rows to the
/// `following` row they are stored as.
pub async fn delete(
	database: &Database,
	user: Uuid,
	relation_user: Uuid,
	kind: RelationKind,
) -> Result<u64, sqlx::Error> {
	let (stored, side) = kind.storage();

	sqlx::query(&format!(
		"DELETE FROM user_relation WHERE {own} = $1 AND {other} = $2 AND relation_type = $3",
		own = side.column(),
		other = side.other().column(),
	))
	.bind(user)
	.bind(relation_user)
	.bind(stored.as_str())
	.execute(database)
	.await
	.map(|result| result.rows_affected())
}
