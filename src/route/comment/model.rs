use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
	db::{comment::DbComment, user::DbUser},
	pagination::{self, Cursor},
	route::user::model::User,
};

/// A comment on a post.
#[model]
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Comment {
	/// The unique identifier of the comment.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The post the comment belongs to.
	#[serde(skip_deserializing)]
	pub post_id: Uuid,
	/// The user that wrote the comment.
	#[serde(skip_deserializing)]
	pub user_id: Uuid,
	/// The author of the comment.
	#[serde(skip_deserializing)]
	pub user: User,
	/// The text of the comment.
	#[validate(length(min = 1, max = 2048))]
	pub content: String,
	/// The number of likes on the comment.
	#[serde(skip_deserializing)]
	pub likes: i64,
	/// Whether the requester liked the comment.
	#[serde(skip_deserializing)]
	pub liked: bool,
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

impl Comment {
	pub fn new(comment: DbComment, user: DbUser) -> Self {
		Self {
			id: comment.id,
			post_id: comment.post_id,
			user_id: comment.user_id,
			user: user.into(),
			content: comment.content,
			likes: comment.likes,
			liked: comment.liked,
			created_at: comment.created_at,
			updated_at: comment.updated_at,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CommentPostPath {
	pub post: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CommentPath {
	pub post: Uuid,
	pub comment: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[validate(schema(function = "validate_comment_cursor"))]
pub struct CommentQuery {
	/// The creation time of the last comment seen, defaults to now.
	pub last_seen_comment_created_at: Option<DateTime<Utc>>,
	pub last_seen_comment_id: Option<Uuid>,
	/// The number of comments to return.
	#[validate(range(min = 1, max = 50))]
	#[serde(default = "pagination::default_count")]
	pub count: i64,
}

fn validate_comment_cursor(query: &CommentQuery) -> Result<(), ValidationError> {
	pagination::validate_cursor(
		query.last_seen_comment_created_at,
		query.last_seen_comment_id,
	)
}

impl CommentQuery {
	pub fn cursor(&self) -> Cursor {
		Cursor::new(
			self.last_seen_comment_created_at,
			self.last_seen_comment_id,
		)
	}
}

#[cfg(test)]
mod test {
	use serde_json::json;
	use validator::Validate;

	use super::*;

	#[test]
	fn test_create_comment_input() {
		let input = serde_json::from_value::<CreateComment>(json!({
			"content": "nice",
			"id": "not even a uuid",
			"likes": 1000,
		}))
		.unwrap();

		assert_eq!(input.content, "nice");
		assert!(input.validate().is_ok());

		let empty = serde_json::from_value::<CreateComment>(json!({ "content": "" })).unwrap();

		assert!(empty.validate().is_err());
	}

	#[test]
	fn test_update_comment_input() {
		let input = serde_json::from_value::<UpdateComment>(json!({})).unwrap();

		assert!(input.content.is_none());
		assert!(input.validate().is_ok());
	}
}
