use std::sync::Arc;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	db::{self, user::DbUser},
	error::RouteError,
	openapi::SECURITY_SCHEME_BEARER,
	route::auth,
	token::{Claims, Keys},
	Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// The user an access token was issued for.
///
/// Tokens are read from the `Authorization: Bearer <token>` header. A missing
/// header is a [`auth::Error::MissingToken`]; a malformed, forged or expired
/// token, or one whose user no longer exists, is a [`auth::Error::InvalidToken`].
///
/// ```rust
/// async fn route(auth: Auth) {
///   println!("{:?}", auth.user);
/// }
/// ```
#[derive(Debug)]
pub struct Auth {
	pub user: DbUser,
}

impl Auth {
	pub fn id(&self) -> uuid::Uuid {
		self.user.id
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Auth
where
	Database: FromRef<S>,
	Arc<Keys>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let claims = claims(parts, &Arc::<Keys>::from_ref(state))?;

		let database = Database::from_ref(state);
		let user = db::user::find(&database, claims.id)
			.await?
			.ok_or(auth::Error::InvalidToken)?;

		Ok(Self { user })
	}
}

/// Reads and verifies the bearer token of a request.
fn claims(parts: &request::Parts, keys: &Keys) -> Result<Claims, auth::Error> {
	let header = parts
		.headers
		.get(header::AUTHORIZATION)
		.ok_or(auth::Error::MissingToken)?;

	let token = header
		.to_str()
		.ok()
		.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
		.ok_or(auth::Error::InvalidToken)?;

	keys.verify(token.trim()).map_err(|e| {
		tracing::debug!(error = %e, "rejected access token");
		auth::Error::InvalidToken
	})
}

/// A verified access token, without loading its user.
///
/// Unlike [`Auth`], this accepts tokens whose user has since been deleted.
#[derive(Debug)]
pub struct Token {
	pub claims: Claims,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Token
where
	Arc<Keys>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self {
			claims: claims(parts, &Arc::<Keys>::from_ref(state))?,
		})
	}
}

impl OperationInput for Token {
	fn operation_input(ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		Auth::operation_input(ctx, operation);
	}
}

impl OperationInput for Auth {
	/// Operation input for the auth extractor.
	///
	/// This adds a bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}
