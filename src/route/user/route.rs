use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;

use crate::{
	db,
	extract::{Auth, Json, Path, Query, Token},
	openapi::tag,
	password,
	route::model::{reply, Data, Page, Reply},
	AppState, Database,
};

use super::{model, Error, RouteError};

/// List users
/// Returns a page of users, newest first.
#[route(tag = tag::USER)]
pub async fn get_users(
	State(database): State<Database>,
	Query(query): Query<model::UserQuery>,
) -> Result<Reply<Page<model::User>>, RouteError> {
	let users = db::user::list(&database, query.cursor(), query.count).await?;

	Ok(reply(Page::new(
		users.into_iter().map(model::User::from).collect(),
	)))
}

/// Get user
/// Returns a single user by their unique id.
#[route(tag = tag::USER)]
pub async fn get_user(
	State(database): State<Database>,
	Path(path): Path<model::UserPath>,
) -> Result<Reply<Data<model::User>>, RouteError> {
	let user = db::user::find(&database, path.user)
		.await?
		.ok_or(Error::UnknownUser(path.user))?;

	Ok(reply(Data::new(user.into())))
}

/// Get user by username
/// Returns a single user by their username.
#[route(tag = tag::USER)]
pub async fn get_user_by_username(
	State(database): State<Database>,
	Path(path): Path<model::UsernamePath>,
) -> Result<Reply<Data<model::User>>, RouteError> {
	let user = db::user::find_by_username(&database, &path.username)
		.await?
		.ok_or_else(|| Error::UnknownUsername(path.username.clone()))?;

	Ok(reply(Data::new(user.into())))
}

/// Update user
/// Updates the authenticated user's profile. Missing or empty fields are left unchanged.
#[route(tag = tag::USER)]
pub async fn update_user(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::UserPath>,
	Json(input): Json<model::UpdateUserInput>,
) -> Result<Reply<Data<model::User>>, RouteError> {
	if path.user != auth.id() {
		return Err(Error::NotSelf.into());
	}

	let user = db::user::update(&database, auth.id(), input.into())
		.await
		.map_err(|e| match db::user::taken(&e) {
			Some(taken) => Error::from(taken).into(),
			None => RouteError::from(e),
		})?
		.ok_or(Error::UnknownUser(auth.id()))?;

	Ok(reply(Data::new(model::User::private(user))))
}

/// Change password
/// Replaces the authenticated user's password. The current password is required.
#[route(tag = tag::USER, response(status = 204, description = "Password changed."))]
pub async fn update_password(
	State(state): State<AppState>,
	auth: Auth,
	Json(input): Json<model::UpdatePasswordInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	if !password::verify(&state.hasher, &input.old_password, &auth.user.password)? {
		return Err(Error::WrongPassword.into());
	}

	let hashed = password::hash(&state.hasher, &input.new_password)?;

	db::user::update_password(&state.database, auth.id(), &hashed).await?;

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Delete user
/// Deletes the authenticated user. Deleting an already deleted user succeeds.
#[route(tag = tag::USER, response(status = 204, description = "User deleted."))]
pub async fn delete_user(
	State(database): State<Database>,
	token: Token,
	Path(path): Path<model::UserPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	if path.user != token.claims.id {
		return Err(Error::NotSelf.into());
	}

	if db::user::soft_delete(&database, path.user).await? > 0 {
		tracing::info!(user = %path.user, "user deleted");
	}

	Ok(StatusCode::NO_CONTENT.into_response())
}
