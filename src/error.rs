use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A machine-readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Extra context about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Serialize) -> Self {
		let details = self.details.get_or_insert_with(|| Cow::Owned(Map::new()));

		details
			.to_mut()
			.insert(key.into(), serde_json::json!(value));

		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
///
/// `message` is a short summary, `errors` carries one entry per problem
/// (e.g. one per invalid field).
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody<'a> {
	pub error: bool,
	pub message: Cow<'a, str>,
	pub errors: Vec<Message<'a>>,
}

/// Implemented by every route-level error enum.
///
/// The `Display` output of these errors is sent to the client as the
/// summary message, so it must not contain sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message<'_>> {
		Message::new(self.to_string()).into_vec()
	}
}

/// Errors shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] axum::extract::multipart::MultipartRejection),
	#[error("multipart field error: {0}")]
	MultipartField(#[from] axum::extract::multipart::MultipartError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("token error: {0}")]
	Token(#[from] jsonwebtoken::errors::Error),
	#[error("password hash error: {0}")]
	Hash(#[from] argon2::password_hash::Error),
	#[error("task error: {0}")]
	Task(#[from] tokio::task::JoinError),
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..)
			| Self::Json(..)
			| Self::Query(..)
			| Self::Path(..)
			| Self::Multipart(..)
			| Self::MultipartField(..) => StatusCode::BAD_REQUEST,
			Self::Database(..) | Self::Io(..) | Self::Token(..) | Self::Hash(..) | Self::Task(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	fn summary(&self) -> &'static str {
		match self {
			Self::Validation(..) => "validation failed",
			Self::Json(..) => "invalid json body",
			Self::Query(..) => "invalid query string",
			Self::Path(..) => "invalid path parameters",
			Self::Multipart(..) | Self::MultipartField(..) => "invalid multipart body",
			_ => "internal server error",
		}
	}

	pub fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						let content = error
							.message
							.clone()
							.unwrap_or_else(|| error.code.clone());

						Message::new(content).field(field)
					})
				})
				.collect(),
			Self::Json(error) => Message::new(error.body_text()).into_vec(),
			Self::Query(error) => Message::new(error.body_text()).into_vec(),
			Self::Path(error) => Message::new(error.body_text()).into_vec(),
			Self::Multipart(error) => Message::new(error.body_text()).into_vec(),
			Self::MultipartField(error) => Message::new(error.to_string()).into_vec(),
			_ => Vec::new(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		(
			status,
			Json(ErrorBody {
				error: true,
				message: self.summary().into(),
				errors: self.errors(),
			}),
		)
			.into_response()
	}
}

/// The error type returned by route handlers.
///
/// Wraps either a route-specific error `E` or a shared [`AppError`].
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<sqlx::Error> for RouteError<E> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<std::io::Error> for RouteError<E> {
	fn from(error: std::io::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<jsonwebtoken::errors::Error> for RouteError<E> {
	fn from(error: jsonwebtoken::errors::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<argon2::password_hash::Error> for RouteError<E> {
	fn from(error: argon2::password_hash::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<tokio::task::JoinError> for RouteError<E> {
	fn from(error: tokio::task::JoinError) -> Self {
		Self::App(error.into())
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(error = ?error, "request failed");
				}

				(
					status,
					Json(ErrorBody {
						error: true,
						message: error.to_string().into(),
						errors: error.errors(),
					}),
				)
					.into_response()
			}
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorBody<'static>;
}
