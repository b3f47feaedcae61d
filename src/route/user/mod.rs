use aide::axum::{
	routing::{get_with, patch_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{db::user::Taken, error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(Uuid),
	#[error("unknown username {0:?}")]
	UnknownUsername(String),
	#[error("not enough permission to modify another user")]
	NotSelf,
	#[error("wrong password")]
	WrongPassword,
	#[error("email already taken")]
	EmailTaken,
	#[error("username already taken")]
	UsernameTaken,
}

impl From<Taken> for Error {
	fn from(taken: Taken) -> Self {
		match taken {
			Taken::Email => Self::EmailTaken,
			Taken::Username => Self::UsernameTaken,
		}
	}
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(get_users, get_users_docs))
		.api_route(
			"/username/:username",
			get_with(get_user_by_username, get_user_by_username_docs),
		)
		.api_route("/password", patch_with(update_password, update_password_docs))
		.api_route(
			"/:user",
			get_with(get_user, get_user_docs)
				.patch_with(update_user, update_user_docs)
				.delete_with(delete_user, delete_user_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) | Self::UnknownUsername(..) => StatusCode::NOT_FOUND,
			Self::NotSelf | Self::WrongPassword => StatusCode::FORBIDDEN,
			Self::EmailTaken | Self::UsernameTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownUser(user) => error::Message::new("unknown_user")
				.detail("user", user)
				.into_vec(),
			Self::UnknownUsername(username) => error::Message::new("unknown_user")
				.field("username")
				.detail("username", username)
				.into_vec(),
			Self::WrongPassword => error::Message::new("wrong_password")
				.field("old_password")
				.into_vec(),
			Self::EmailTaken => error::Message::new("taken").field("email").into_vec(),
			Self::UsernameTaken => error::Message::new("taken").field("username").into_vec(),
			Self::NotSelf => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_profile_update(pool: Database) {
		let app = app(pool);
		let (id, token) = register(&app, "ann").await;

		let response = app
			.patch(&format!("/api/v1/users/{id}"))
			.bearer(&token)
			.json(&json!({ "name": "Ann Smith", "about": "", "username": "" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["error"], false);
		assert_eq!(body["data"]["name"], "Ann Smith");
		assert_eq!(body["data"]["username"], "ann");
		assert_eq!(body["data"]["email"], "ann@example.com");

		let response = app.get(&format!("/api/v1/users/{id}")).await;

		assert_eq!(response.status_code(), 200);
		assert!(response.json::<Value>()["data"].get("email").is_none());

		let response = app.get("/api/v1/users/username/ann").await;

		assert_eq!(response.json::<Value>()["data"]["id"], id.to_string());
	}

	#[sqlx::test]
	async fn test_cannot_modify_others(pool: Database) {
		let app = app(pool);
		let (ann, _) = register(&app, "ann").await;
		let (_, bob) = register(&app, "bob").await;

		let response = app
			.patch(&format!("/api/v1/users/{ann}"))
			.bearer(&bob)
			.json(&json!({ "name": "Bob" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.delete(&format!("/api/v1/users/{ann}"))
			.bearer(&bob)
			.await;

		assert_eq!(response.status_code(), 403);
	}

	#[sqlx::test]
	async fn test_update_password(pool: Database) {
		let app = app(pool);
		let (_, token) = register(&app, "ann").await;

		let response = app
			.patch("/api/v1/users/password")
			.bearer(&token)
			.json(&json!({ "old_password": "wrong-password", "new_password": "correct horse" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.patch("/api/v1/users/password")
			.bearer(&token)
			.json(&json!({ "old_password": PASSWORD, "new_password": "correct horse" }))
			.await;

		assert_eq!(response.status_code(), 204);

		let response = app
			.post("/api/v1/login")
			.json(&json!({ "email": "ann@example.com", "password": "correct horse" }))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_delete_is_idempotent(pool: Database) {
		let app = app(pool);
		let (id, token) = register(&app, "ann").await;

		for _ in 0..2 {
			let response = app
				.delete(&format!("/api/v1/users/{id}"))
				.bearer(&token)
				.await;

			assert_eq!(response.status_code(), 204);
		}

		assert_eq!(app.get(&format!("/api/v1/users/{id}")).await.status_code(), 404);
		assert_eq!(
			app.get("/api/v1/fetch")
				.bearer(&token)
				.await
				.status_code(),
			401
		);

		// the username is free again once its owner is gone
		register(&app, "ann").await;
	}
}
