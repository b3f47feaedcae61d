use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{db::user::Taken, error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidCredentials,
	#[error("missing bearer token")]
	MissingToken,
	#[error("invalid or expired token")]
	InvalidToken,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
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
		.api_route("/login", post_with(login, login_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/fetch", get_with(fetch, fetch_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials | Self::MissingToken | Self::InvalidToken => {
				StatusCode::UNAUTHORIZED
			}
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::EmailTaken => error::Message::new("taken").field("email").into_vec(),
			Self::UsernameTaken => error::Message::new("taken").field("username").into_vec(),
			_ => error::Message::new(self.to_string()).into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool);
		let (id, token) = register(&app, "john").await;

		let response = app
			.post("/api/v1/login")
			.json(&json!({
				"email": "john@example.com",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["error"], false);
		assert_eq!(body["user"]["id"], id.to_string());
		assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));

		let response = app.get("/api/v1/fetch").bearer(&token).await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["user"]["username"], "john");
		assert_eq!(body["user"]["email"], "john@example.com");
		assert!(body["user"].get("password").is_none());
	}

	#[sqlx::test]
	async fn test_duplicate_registration(pool: Database) {
		let app = app(pool);

		register(&app, "john").await;

		let response = app
			.post("/api/v1/register")
			.json(&json!({
				"email": "john@example.com",
				"username": "johnny",
				"name": "John",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "email");

		let response = app
			.post("/api/v1/register")
			.json(&json!({
				"email": "johnny@example.com",
				"username": "john",
				"name": "John",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "username");
	}

	#[sqlx::test]
	async fn test_bad_credentials(pool: Database) {
		let app = app(pool);

		register(&app, "john").await;

		for (email, password) in [
			("john@example.com", "not-the-password"),
			("nobody@example.com", PASSWORD),
		] {
			let response = app
				.post("/api/v1/login")
				.json(&json!({ "email": email, "password": password }))
				.await;

			assert_eq!(response.status_code(), 401);
			assert_eq!(response.json::<Value>()["error"], true);
		}
	}

	#[sqlx::test]
	async fn test_token_required(pool: Database) {
		let app = app(pool);

		assert_eq!(app.get("/api/v1/fetch").await.status_code(), 401);
		assert_eq!(
			app.get("/api/v1/fetch").bearer("garbage").await.status_code(),
			401
		);
		assert_eq!(app.get("/api/v1/posts").await.status_code(), 401);
	}

	#[sqlx::test]
	async fn test_register_validation(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/api/v1/register")
			.json(&json!({
				"email": "not-an-email",
				"username": "a b",
				"name": "John",
				"password": "short",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<Value>();
		let fields = body["errors"]
			.as_array()
			.unwrap()
			.iter()
			.filter_map(|error| error["field"].as_str())
			.collect::<Vec<_>>();

		assert!(fields.contains(&"email"));
		assert!(fields.contains(&"username"));
		assert!(fields.contains(&"password"));
	}
}
