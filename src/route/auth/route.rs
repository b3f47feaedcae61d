use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	db::{self, user::NewUser},
	extract::{Auth, Json},
	openapi::tag,
	password,
	route::{
		model::{reply, Reply},
		user::model::User,
	},
	AppState,
};

use super::{model, Error, RouteError};

/// Log in
/// Exchanges an email and password for an access token.
#[route(tag = tag::AUTH)]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<Reply<model::Session>, RouteError> {
	let user = db::user::find_by_email(&state.database, &input.email)
		.await?
		.ok_or(Error::InvalidCredentials)?;

	if !password::verify(&state.hasher, &input.password, &user.password)? {
		return Err(Error::InvalidCredentials.into());
	}

	let token = state.keys.issue(user.id)?;

	Ok(reply(model::Session {
		user: User::private(user),
		token,
	}))
}

/// Register
/// Creates a new account and logs in to it.
#[route(tag = tag::AUTH, response(status = 201, shape = "Reply<model::Session>", description = "Account created."))]
pub async fn register(
	State(state): State<AppState>,
	Json(input): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let hashed = password::hash(&state.hasher, &input.password)?;

	let user = db::user::insert(
		&state.database,
		NewUser {
			email: &input.email,
			username: &input.username,
			name: &input.name,
			password: &hashed,
		},
	)
	.await
	.map_err(|e| match db::user::taken(&e) {
		Some(taken) => Error::from(taken).into(),
		None => RouteError::from(e),
	})?;

	tracing::info!(user = %user.id, "user registered");

	let token = state.keys.issue(user.id)?;

	Ok((
		StatusCode::CREATED,
		reply(model::Session {
			user: User::private(user),
			token,
		}),
	))
}

/// Fetch session
/// Returns the authenticated user along with a new access token.
#[route(tag = tag::AUTH)]
pub async fn fetch(
	State(state): State<AppState>,
	auth: Auth,
) -> Result<Reply<model::Session>, RouteError> {
	let token = state.keys.issue(auth.id())?;

	Ok(reply(model::Session {
		user: User::private(auth.user),
		token,
	}))
}
