use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
	db::{post::DbPost, user::DbUser},
	media,
	pagination::{self, Cursor},
	route::{comment::model::Comment, user::model::User},
	visibility::FetchMode,
};

/// The number of newest comments embedded in every post.
pub const PREVIEW_COMMENT_COUNT: i64 = 20;

/// Accepts only paths handed out by the upload route, e.g. `/data/image/<name>`.
fn validate_media_path(path: &str) -> Result<(), ValidationError> {
	let valid = path
		.strip_prefix("/data/")
		.and_then(|rest| rest.split_once('/'))
		.is_some_and(|(base, name)| {
			media::ALLOWED_BASE_TYPES.contains(&base) && media::is_file_name(name)
		});

	if !valid {
		let mut error = ValidationError::new("media_path");
		error.message = Some("content must be a path returned by the upload route".into());

		return Err(error);
	}

	Ok(())
}

/// A single post, created by a user.
#[model]
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that created the post.
	#[serde(skip_deserializing)]
	pub user_id: Uuid,
	/// The author of the post.
	#[serde(skip_deserializing)]
	pub user: User,
	/// Path of the post's media, as returned by the upload route.
	#[model(create_only)]
	#[validate(length(max = 256), custom(function = "validate_media_path"))]
	pub content: String,
	/// A caption for the media.
	#[serde(default)]
	#[validate(length(max = 2048))]
	pub description: String,
	/// The number of likes on the post.
	#[serde(skip_deserializing)]
	pub likes: i64,
	/// Whether the requester liked the post.
	#[serde(skip_deserializing)]
	pub liked: bool,
	/// The newest comments on the post, newest first.
	#[serde(skip_deserializing)]
	pub comments: Vec<Comment>,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

impl Post {
	pub fn new(post: DbPost, user: DbUser, comments: Vec<Comment>) -> Self {
		Self {
			id: post.id,
			user_id: post.user_id,
			user: user.into(),
			content: post.content,
			description: post.description,
			likes: post.likes,
			liked: post.liked,
			comments,
			created_at: post.created_at,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PostPath {
	pub post: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[validate(schema(function = "validate_post_cursor"))]
pub struct PostQuery {
	/// Which posts to list.
	#[serde(rename = "type", default = "default_fetch_mode")]
	pub kind: FetchMode,
	/// The author to list posts of, required when `type` is `user`.
	pub user_id: Option<Uuid>,
	/// The creation time of the last post seen, defaults to now.
	pub last_seen_post_created_at: Option<DateTime<Utc>>,
	pub last_seen_post_id: Option<Uuid>,
	/// The number of posts to return.
	#[validate(range(min = 1, max = 50))]
	#[serde(default = "pagination::default_count")]
	pub count: i64,
}

fn default_fetch_mode() -> FetchMode {
	FetchMode::All
}

fn validate_post_cursor(query: &PostQuery) -> Result<(), ValidationError> {
	pagination::validate_cursor(query.last_seen_post_created_at, query.last_seen_post_id)
}

impl PostQuery {
	pub fn cursor(&self) -> Cursor {
		Cursor::new(self.last_seen_post_created_at, self.last_seen_post_id)
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct PostCountQuery {
	#[serde(rename = "type", default = "default_fetch_mode")]
	pub kind: FetchMode,
	pub user_id: Option<Uuid>,
}

#[cfg(test)]
mod test {
	use serde_json::json;
	use validator::Validate;

	use super::*;

	#[test]
	fn test_validate_media_path() {
		let name = media::file_name();

		assert!(validate_media_path(&format!("/data/image/{name}")).is_ok());
		assert!(validate_media_path(&format!("/data/video/{name}")).is_err());
		assert!(validate_media_path("/data/image/../../etc/passwd").is_err());
		assert!(validate_media_path("https://example.com/cat.jpg").is_err());
	}

	#[test]
	fn test_create_post_input() {
		let input = serde_json::from_value::<CreatePost>(json!({
			"content": format!("/data/image/{}", media::file_name()),
		}))
		.unwrap();

		assert_eq!(input.description, "");
		assert!(input.validate().is_ok());

		let input = CreatePost {
			description: "x".repeat(2049),
			..input
		};

		assert!(input.validate().is_err());
	}

	#[test]
	fn test_content_cannot_be_updated() {
		let input = serde_json::from_value::<UpdatePost>(json!({
			"content": "/data/image/other",
			"description": "new caption",
		}))
		.unwrap();

		assert_eq!(input.description.as_deref(), Some("new caption"));
	}

	#[test]
	fn test_post_query_defaults() {
		let query = serde_json::from_value::<PostQuery>(json!({})).unwrap();

		assert_eq!(query.kind, FetchMode::All);
		assert_eq!(query.count, pagination::DEFAULT_COUNT);
		assert!(query.validate().is_ok());

		let query = serde_json::from_value::<PostQuery>(json!({
			"type": "user",
			"last_seen_post_id": Uuid::new_v4(),
		}))
		.unwrap();

		assert!(query.validate().is_err());
		assert!(serde_json::from_value::<PostQuery>(json!({ "type": "friends" })).is_err());
	}
}
