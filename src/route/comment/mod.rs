use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	error::{self, ErrorShape},
	policy, visibility, AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown comment {0}")]
	UnknownComment(Uuid),
	#[error("comment already liked")]
	AlreadyLiked(Uuid),
	#[error(transparent)]
	Visibility(#[from] visibility::Error),
	#[error(transparent)]
	Policy(#[from] policy::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/:post/comments",
			get_with(get_comments, get_comments_docs)
				.post_with(create_comment, create_comment_docs),
		)
		.api_route(
			"/:post/comments/count",
			get_with(count_comments, count_comments_docs),
		)
		.api_route(
			"/:post/comments/:comment",
			get_with(get_comment, get_comment_docs)
				.patch_with(update_comment, update_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
		.api_route(
			"/:post/comments/:comment/like",
			post_with(like_comment, like_comment_docs)
				.delete_with(unlike_comment, unlike_comment_docs),
		)
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment(..) => StatusCode::NOT_FOUND,
			Self::AlreadyLiked(..) => StatusCode::CONFLICT,
			Self::Visibility(error) => error.status(),
			Self::Policy(error) => error.status(),
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.field("post")
				.detail("post", post)
				.into_vec(),
			Self::UnknownComment(comment) => error::Message::new("unknown_comment")
				.field("comment")
				.detail("comment", comment)
				.into_vec(),
			Self::AlreadyLiked(comment) => error::Message::new("already_liked")
				.detail("comment", comment)
				.into_vec(),
			Self::Visibility(error) => error.errors(),
			Self::Policy(error) => error.errors(),
		}
	}
}
