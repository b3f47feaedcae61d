use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	error::{self, ErrorShape},
	visibility::{self, RelationKind},
	AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("not enough permission to access another user's relations")]
	NotSelf,
	#[error("can't add a relation with yourself")]
	SelfRelation,
	#[error("can't add a {0} relation, follow the user instead")]
	NotStorable(RelationKind),
	#[error("unknown user {0}")]
	UnknownUser(Uuid),
	#[error("{0} relation already exists")]
	AlreadyExists(RelationKind),
	#[error(transparent)]
	Visibility(#[from] visibility::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/:user/relations", get_with(get_relations, get_relations_docs))
		.api_route(
			"/:user/relations/count",
			get_with(count_relations, count_relations_docs),
		)
		.api_route(
			"/:user/relations/:relation_user",
			get_with(get_relation_status, get_relation_status_docs)
				.post_with(add_relation, add_relation_docs)
				.delete_with(delete_relation, delete_relation_docs),
		)
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::NotSelf => StatusCode::FORBIDDEN,
			Self::SelfRelation | Self::NotStorable(..) => StatusCode::BAD_REQUEST,
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::AlreadyExists(..) => StatusCode::CONFLICT,
			Self::Visibility(error) => error.status(),
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::SelfRelation => error::Message::new("self_relation")
				.field("relation_user")
				.into_vec(),
			Self::NotStorable(kind) => error::Message::new("unknown_relation")
				.field("type")
				.detail("type", kind)
				.into_vec(),
			Self::UnknownUser(user) => error::Message::new("unknown_user")
				.field("relation_user")
				.detail("user", user)
				.into_vec(),
			Self::AlreadyExists(kind) => error::Message::new("relation_exists")
				.detail("type", kind)
				.into_vec(),
			Self::Visibility(error) => error.errors(),
			Self::NotSelf => error::Message::new(self.to_string()).into_vec(),
		}
	}
}
