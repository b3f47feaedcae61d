use uuid::Uuid;

use crate::Database;

/// Something a user can like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
	Post(Uuid),
	Comment(Uuid),
}

impl Target {
	/// The like table and the column holding the liked row's id.
	fn table(self) -> (&'static str, &'static str, Uuid) {
		match self {
			Self::Post(id) => ("post_like", "post_id", id),
			Self::Comment(id) => ("comment_like", "comment_id", id),
		}
	}
}

/// Likes `target`. A second like by the same user is a unique violation.
pub async fn insert(database: &Database, target: Target, user_id: Uuid) -> Result<(), sqlx::Error> {
	let (table, column, id) = target.table();

	sqlx::query(&format!(
		"INSERT INTO {table} (id, {column}, user_id) VALUES ($1, $2, $3)"
	))
	.bind(Uuid::new_v4())
	.bind(id)
	.bind(user_id)
	.execute(database)
	.await?;

	Ok(())
}

/// Removes a like, returning how many rows went away (0 or 1).
pub async fn delete(database: &Database, target: Target, user_id: Uuid) -> Result<u64, sqlx::Error> {
	let (table, column, id) = target.table();

	sqlx::query(&format!(
		"DELETE FROM {table} WHERE {column} = $1 AND user_id = $2"
	))
	.bind(id)
	.bind(user_id)
	.execute(database)
	.await
	.map(|result| result.rows_affected())
}
