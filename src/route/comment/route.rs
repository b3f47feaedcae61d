use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use macros::route;
use uuid::Uuid;
use validator::Validate;

use crate::{
	db::{self, comment::DbComment, like},
	extract::{Auth, Json, Path, Query, Unchecked},
	openapi::tag,
	policy,
	route::{
		model::{reply, Count, Data, Page, Reply},
		post::assemble,
	},
	visibility, AppState, Database,
};

use super::{model, Error, RouteError};

/// Fails unless the post exists and the viewer may see it.
async fn ensure_post(database: &Database, viewer: Uuid, post: Uuid) -> Result<(), RouteError> {
	let post = db::post::find(database, viewer, post)
		.await?
		.ok_or(Error::UnknownPost(post))?;

	visibility::ensure_visible::<Error>(database, viewer, post.user_id).await
}

async fn find_comment(
	database: &Database,
	viewer: Uuid,
	path: &model::CommentPath,
) -> Result<DbComment, RouteError> {
	Ok(db::comment::find(database, viewer, path.post, path.comment)
		.await?
		.ok_or(Error::UnknownComment(path.comment))?)
}

async fn reload(
	database: &Database,
	viewer: Uuid,
	path: &model::CommentPath,
) -> Result<model::Comment, RouteError> {
	let comment = find_comment(database, viewer, path).await?;

	Ok(assemble::load_comments(database, vec![comment])
		.await?
		.pop()
		.ok_or(Error::UnknownComment(path.comment))?)
}

/// List comments
/// Returns a page of comments on a post, newest first.
#[route(tag = tag::COMMENT)]
pub async fn get_comments(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::CommentPostPath>,
	Query(query): Query<model::CommentQuery>,
) -> Result<Reply<Page<model::Comment>>, RouteError> {
	ensure_post(&database, auth.id(), path.post).await?;

	let rows =
		db::comment::list(&database, auth.id(), path.post, query.cursor(), query.count).await?;
	let comments = assemble::load_comments(&database, rows).await?;

	Ok(reply(Page::new(comments)))
}

/// Count comments
#[route(tag = tag::COMMENT)]
pub async fn count_comments(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::CommentPostPath>,
) -> Result<Reply<Count>, RouteError> {
	ensure_post(&database, auth.id(), path.post).await?;

	let count = db::comment::count(&database, path.post).await?;

	Ok(reply(Count { count }))
}

/// Get comment
/// Returns a single comment on a post.
#[route(tag = tag::COMMENT)]
pub async fn get_comment(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::CommentPath>,
) -> Result<Reply<Data<model::Comment>>, RouteError> {
	ensure_post(&database, auth.id(), path.post).await?;

	Ok(reply(Data::new(reload(&database, auth.id(), &path).await?)))
}

/// Add comment
/// Adds a comment to a post.
#[route(tag = tag::COMMENT, response(status = 201, shape = "Reply<Data<model::Comment>>", description = "Comment added."))]
pub async fn create_comment(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::CommentPostPath>,
	Json(input): Json<model::CreateComment>,
) -> Result<impl IntoApiResponse, RouteError> {
	ensure_post(&database, auth.id(), path.post).await?;

	let comment = db::comment::insert(&database, path.post, auth.id(), &input.content).await?;

	tracing::info!(comment = %comment.id, post = %path.post, "comment added");

	Ok((
		StatusCode::CREATED,
		reply(Data::new(model::Comment::new(comment, auth.user))),
	))
}

/// Update comment
/// Updates the content of a comment. Only the author can edit a comment, and only for a while after writing it.
#[route(tag = tag::COMMENT)]
pub async fn update_comment(
	State(state): State<AppState>,
	auth: Auth,
	Path(path): Path<model::CommentPath>,
	Unchecked(input): Unchecked<model::UpdateComment>,
) -> Result<Reply<Data<model::Comment>>, RouteError> {
	let comment = find_comment(&state.database, auth.id(), &path).await?;

	policy::ensure_author("comment", "edit", auth.id(), comment.user_id).map_err(Error::Policy)?;
	policy::ensure_editable(
		"comment",
		comment.created_at,
		Utc::now(),
		state.config.edit_window,
	)
	.map_err(Error::Policy)?;
	input.validate()?;

	if let Some(content) = input.content.filter(|c| !c.is_empty()) {
		db::comment::update_content(&state.database, comment.id, &content).await?;
	}

	Ok(reply(Data::new(reload(&state.database, auth.id(), &path).await?)))
}

/// Delete comment
/// Deletes a comment. Only the author can delete a comment. Deleting a missing comment succeeds.
#[route(tag = tag::COMMENT, response(status = 204, description = "Comment deleted."))]
pub async fn delete_comment(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::CommentPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	if let Some(comment) = db::comment::find(&database, auth.id(), path.post, path.comment).await? {
		policy::ensure_author("comment", "delete", auth.id(), comment.user_id)
			.map_err(Error::Policy)?;

		db::comment::soft_delete(&database, comment.id).await?;
	}

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Like comment
/// Likes a comment, returning it with the new like count. A comment can only be liked once.
#[route(tag = tag::COMMENT)]
pub async fn like_comment(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::CommentPath>,
) -> Result<Reply<Data<model::Comment>>, RouteError> {
	ensure_post(&database, auth.id(), path.post).await?;

	let comment = find_comment(&database, auth.id(), &path).await?;

	like::insert(&database, like::Target::Comment(comment.id), auth.id())
		.await
		.map_err(|e| {
			if db::is_unique_violation(&e) {
				Error::AlreadyLiked(comment.id).into()
			} else {
				RouteError::from(e)
			}
		})?;

	Ok(reply(Data::new(reload(&database, auth.id(), &path).await?)))
}

/// Unlike comment
/// Removes the requester's like from a comment, returning the comment. Unliking a comment that was not liked succeeds.
#[route(tag = tag::COMMENT)]
pub async fn unlike_comment(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::CommentPath>,
) -> Result<Reply<Data<model::Comment>>, RouteError> {
	ensure_post(&database, auth.id(), path.post).await?;

	let comment = find_comment(&database, auth.id(), &path).await?;

	like::delete(&database, like::Target::Comment(comment.id), auth.id()).await?;

	Ok(reply(Data::new(reload(&database, auth.id(), &path).await?)))
}
