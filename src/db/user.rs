use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{pagination::{self, Cursor}, Database};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbUser {
	pub id: Uuid,
	pub email: String,
	pub username: String,
	pub name: String,
	pub about: Option<String>,
	pub avatar_url: Option<String>,
	/// Argon2 PHC string.
	pub password: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

pub struct NewUser<'a> {
	pub email: &'a str,
	pub username: &'a str,
	pub name: &'a str,
	pub password: &'a str,
}

/// Profile fields to overwrite, `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct UserChanges {
	pub email: Option<String>,
	pub username: Option<String>,
	pub name: Option<String>,
	pub about: Option<String>,
	pub avatar_url: Option<String>,
}

/// Which unique field a write collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Taken {
	Email,
	Username,
}

pub fn taken(error: &sqlx::Error) -> Option<Taken> {
	match super::unique_violation(error)? {
		"user_email_key" => Some(Taken::Email),
		"user_username_key" => Some(Taken::Username),
		_ => None,
	}
}

pub async fn find(database: &Database, id: Uuid) -> Result<Option<DbUser>, sqlx::Error> {
	sqlx::query_as::<_, DbUser>(r#"SELECT * FROM "user" WHERE id = $1 AND deleted_at IS NULL"#)
		.bind(id)
		.fetch_optional(database)
		.await
}

pub async fn find_by_username(
	database: &Database,
	username: &str,
) -> Result<Option<DbUser>, sqlx::Error> {
	sqlx::query_as::<_, DbUser>(
		r#"SELECT * FROM "user" WHERE username = $1 AND deleted_at IS NULL"#,
	)
	.bind(username)
	.fetch_optional(database)
	.await
}

pub async fn find_by_email(database: &Database, email: &str) -> Result<Option<DbUser>, sqlx::Error> {
	sqlx::query_as::<_, DbUser>(r#"SELECT * FROM "user" WHERE email = $1 AND deleted_at IS NULL"#)
		.bind(email)
		.fetch_optional(database)
		.await
}

/// Loads every listed user that still exists, in no particular order.
pub async fn find_many(database: &Database, ids: &[Uuid]) -> Result<Vec<DbUser>, sqlx::Error> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	sqlx::query_as::<_, DbUser>(
		r#"SELECT * FROM "user" WHERE id = ANY($1) AND deleted_at IS NULL"#,
	)
	.bind(ids)
	.fetch_all(database)
	.await
}

pub async fn list(database: &Database, cursor: Cursor, count: i64) -> Result<Vec<DbUser>, sqlx::Error> {
	let mut query = QueryBuilder::<Postgres>::new(r#"SELECT u.* FROM "user" u WHERE u.deleted_at IS NULL"#);

	cursor.push_bound(&mut query, "u");
	pagination::push_order(&mut query, "u", count);

	query
		.build_query_as::<DbUser>()
		.fetch_all(database)
		.await
}

pub async fn insert(database: &Database, user: NewUser<'_>) -> Result<DbUser, sqlx::Error> {
	sqlx::query_as::<_, DbUser>(
		r#"
			INSERT INTO "user" (id, email, username, name, password)
			VALUES ($1, $2, $3, $4, $5)
			RETURNING *
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(user.email)
	.bind(user.username)
	.bind(user.name)
	.bind(user.password)
	.fetch_one(database)
	.await
}

pub async fn update(
	database: &Database,
	id: Uuid,
	changes: UserChanges,
) -> Result<Option<DbUser>, sqlx::Error> {
	sqlx::query_as::<_, DbUser>(
		r#"
			UPDATE "user"
			SET email = COALESCE($1, email),
				username = COALESCE($2, username),
				name = COALESCE($3, name),
				about = COALESCE($4, about),
				avatar_url = COALESCE($5, avatar_url),
				updated_at = now()
			WHERE id = $6 AND deleted_at IS NULL
			RETURNING *
		"#,
	)
	.bind(changes.email)
	.bind(changes.username)
	.bind(changes.name)
	.bind(changes.about)
	.bind(changes.avatar_url)
	.bind(id)
	.fetch_optional(database)
	.await
}

pub async fn update_password(database: &Database, id: Uuid, password: &str) -> Result<u64, sqlx::Error> {
	sqlx::query(
		r#"UPDATE "user" SET password = $1, updated_at = now() WHERE id = $2 AND deleted_at IS NULL"#,
	)
	.bind(password)
	.bind(id)
	.execute(database)
	.await
	.map(|result| result.rows_affected())
}

/// Marks the user deleted. Already deleted users are left untouched.
pub async fn soft_delete(database: &Database, id: Uuid) -> Result<u64, sqlx::Error> {
	sqlx::query(r#"UPDATE "user" SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL"#)
		.bind(id)
		.execute(database)
		.await
		.map(|result| result.rows_affected())
}
