use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::user::model::{validate_username, User};

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	/// The email used to log in.
	#[validate(email)]
	pub email: String,
	/// The public handle, letters, digits and underscores only.
	#[validate(length(min = 3, max = 32), custom(function = "validate_username"))]
	pub username: String,
	/// The display name.
	#[validate(length(min = 1, max = 64))]
	pub name: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

/// A user along with a freshly issued access token.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Session {
	pub user: User,
	/// Send as `Authorization: Bearer <token>`.
	pub token: String,
}
