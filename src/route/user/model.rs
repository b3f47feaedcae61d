use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
	db::user::{DbUser, UserChanges},
	pagination::{self, Cursor},
	route::model::empty_as_none,
};

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username
		.chars()
		.any(|c| !c.is_ascii_alphanumeric() && c != '_')
	{
		return Err(ValidationError::new("username must be alphanumeric"));
	}

	Ok(())
}

/// A single user.
#[derive(Debug, Default, Clone, Serialize, JsonSchema)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The user's email address, only shown to the user themself.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// The username that is displayed to the public.
	pub username: String,
	/// The user's display name.
	pub name: String,
	pub about: Option<String>,
	/// Path of the user's avatar, as returned by the upload route.
	pub avatar_url: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<DbUser> for User {
	fn from(user: DbUser) -> Self {
		Self {
			id: user.id,
			email: None,
			username: user.username,
			name: user.name,
			about: user.about,
			avatar_url: user.avatar_url,
			created_at: user.created_at,
			updated_at: user.updated_at,
		}
	}
}

impl User {
	/// The user as they see themself, email included.
	pub fn private(user: DbUser) -> Self {
		let email = user.email.clone();

		Self {
			email: Some(email),
			..user.into()
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UserPath {
	pub user: Uuid,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UsernamePath {
	#[validate(length(min = 3, max = 32))]
	pub username: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
#[validate(schema(function = "validate_user_cursor"))]
pub struct UserQuery {
	/// The creation time of the last user seen, defaults to now.
	pub last_seen_user_created_at: Option<DateTime<Utc>>,
	/// The id of the last user seen, to break ties between equal timestamps.
	pub last_seen_user_id: Option<Uuid>,
	/// The number of users to return.
	#[validate(range(min = 1, max = 50))]
	#[serde(default = "pagination::default_count")]
	pub count: i64,
}

fn validate_user_cursor(query: &UserQuery) -> Result<(), ValidationError> {
	pagination::validate_cursor(query.last_seen_user_created_at, query.last_seen_user_id)
}

impl UserQuery {
	pub fn cursor(&self) -> Cursor {
		Cursor::new(self.last_seen_user_created_at, self.last_seen_user_id)
	}
}

/// Profile changes. Missing or empty fields keep their current value.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UpdateUserInput {
	#[serde(default, deserialize_with = "empty_as_none")]
	#[validate(email)]
	pub email: Option<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	#[validate(length(min = 3, max = 32), custom(function = "validate_username"))]
	pub username: Option<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	#[validate(length(max = 64))]
	pub name: Option<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	#[validate(length(max = 512))]
	pub about: Option<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	#[validate(length(max = 256))]
	pub avatar_url: Option<String>,
}

impl From<UpdateUserInput> for UserChanges {
	fn from(input: UpdateUserInput) -> Self {
		Self {
			email: input.email,
			username: input.username,
			name: input.name,
			about: input.about,
			avatar_url: input.avatar_url,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdatePasswordInput {
	/// The current password.
	#[validate(length(min = 1, max = 128))]
	pub old_password: String,
	#[validate(length(min = 8, max = 128))]
	pub new_password: String,
}

#[cfg(test)]
mod test {
	use chrono::Utc;
	use uuid::Uuid;
	use validator::Validate;

	use super::*;
	use crate::db::user::DbUser;

	fn db_user() -> DbUser {
		DbUser {
			id: Uuid::new_v4(),
			email: "ann@example.com".into(),
			username: "ann".into(),
			name: "Ann".into(),
			about: None,
			avatar_url: None,
			password: "$argon2id$...".into(),
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	#[test]
	fn test_public_user_hides_email_and_password() {
		let value = serde_json::to_value(User::from(db_user())).unwrap();

		assert!(value.get("email").is_none());
		assert!(value.get("password").is_none());
		assert_eq!(value["username"], "ann");
	}

	#[test]
	fn test_private_user_shows_email() {
		let value = serde_json::to_value(User::private(db_user())).unwrap();

		assert_eq!(value["email"], "ann@example.com");
		assert!(value.get("password").is_none());
	}

	#[test]
	fn test_validate_username() {
		assert!(validate_username("ann_99").is_ok());
		assert!(validate_username("ann smith").is_err());
		assert!(validate_username("ann!").is_err());
	}

	#[test]
	fn test_cursor_requires_timestamp() {
		let query = UserQuery {
			last_seen_user_created_at: None,
			last_seen_user_id: Some(Uuid::new_v4()),
			count: 20,
		};

		assert!(query.validate().is_err());

		let query = UserQuery {
			last_seen_user_created_at: Some(Utc::now()),
			..query
		};

		assert!(query.validate().is_ok());
	}

	#[test]
	fn test_count_bounds() {
		let query = |count| UserQuery {
			last_seen_user_created_at: None,
			last_seen_user_id: None,
			count,
		};

		assert!(query(0).validate().is_err());
		assert!(query(51).validate().is_err());
		assert!(query(50).validate().is_ok());
	}
}
