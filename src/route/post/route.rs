use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use macros::route;
use uuid::Uuid;
use validator::Validate;

use crate::{
	db::{self, like, post::DbPost},
	extract::{Auth, Json, Path, Query, Unchecked},
	openapi::tag,
	policy,
	route::model::{reply, Count, Data, Page, Reply},
	visibility, AppState, Database,
};

use super::{assemble, model, Error, RouteError};

/// Loads a post as seen by `viewer`, failing when it is missing or hidden by a block.
async fn visible_post(database: &Database, viewer: Uuid, id: Uuid) -> Result<DbPost, RouteError> {
	let post = db::post::find(database, viewer, id)
		.await?
		.ok_or(Error::UnknownPost(id))?;

	visibility::ensure_visible::<Error>(database, viewer, post.user_id).await?;

	Ok(post)
}

/// Re-reads a post after a write and joins in what it embeds.
async fn reload(database: &Database, viewer: Uuid, id: Uuid) -> Result<model::Post, RouteError> {
	let post = db::post::find(database, viewer, id)
		.await?
		.ok_or(Error::UnknownPost(id))?;

	Ok(assemble::load_post(database, viewer, post)
		.await?
		.ok_or(Error::UnknownPost(id))?)
}

/// List posts
/// Returns a page of posts, newest first.
/// `type=all` lists every post, `type=user` the posts of `user_id`, and `type=subscriptions`
/// the posts of followed users. Posts of users with a block in either direction are never listed.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	auth: Auth,
	Query(query): Query<model::PostQuery>,
) -> Result<Reply<Page<model::Post>>, RouteError> {
	let filter = visibility::resolve::<Error>(&database, auth.id(), query.kind, query.user_id).await?;
	let rows = db::post::list(&database, auth.id(), &filter, query.cursor(), query.count).await?;

	let posts = assemble::load_posts(&database, auth.id(), rows).await?;

	Ok(reply(Page::new(posts)))
}

/// Count posts
/// Returns the number of posts matching the same filters as the post listing.
#[route(tag = tag::POST)]
pub async fn count_posts(
	State(database): State<Database>,
	auth: Auth,
	Query(query): Query<model::PostCountQuery>,
) -> Result<Reply<Count>, RouteError> {
	let filter = visibility::resolve::<Error>(&database, auth.id(), query.kind, query.user_id).await?;
	let count = db::post::count(&database, &filter).await?;

	Ok(reply(Count { count }))
}

/// Get post
/// Returns a single post by its unique id, with its newest comments.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::PostPath>,
) -> Result<Reply<Data<model::Post>>, RouteError> {
	let post = visible_post(&database, auth.id(), path.post).await?;
	let post = assemble::load_post(&database, auth.id(), post)
		.await?
		.ok_or(Error::UnknownPost(path.post))?;

	Ok(reply(Data::new(post)))
}

/// Create post
/// Creates a new post from media previously uploaded to `/data`.
#[route(tag = tag::POST, response(status = 201, shape = "Reply<Data<model::Post>>", description = "Post created."))]
pub async fn create_post(
	State(database): State<Database>,
	auth: Auth,
	Json(input): Json<model::CreatePost>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = db::post::insert(&database, auth.id(), &input.content, &input.description).await?;

	tracing::info!(post = %post.id, user = %auth.id(), "post created");

	Ok((
		StatusCode::CREATED,
		reply(Data::new(model::Post::new(post, auth.user, Vec::new()))),
	))
}

/// Update post
/// Updates the description of a post. Only the author can edit a post, and only for a while after creating it.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(state): State<AppState>,
	auth: Auth,
	Path(path): Path<model::PostPath>,
	Unchecked(input): Unchecked<model::UpdatePost>,
) -> Result<Reply<Data<model::Post>>, RouteError> {
	let post = db::post::find(&state.database, auth.id(), path.post)
		.await?
		.ok_or(Error::UnknownPost(path.post))?;

	policy::ensure_author("post", "edit", auth.id(), post.user_id).map_err(Error::Policy)?;
	policy::ensure_editable("post", post.created_at, Utc::now(), state.config.edit_window)
		.map_err(Error::Policy)?;
	input.validate()?;

	if let Some(description) = input.description.filter(|d| !d.is_empty()) {
		db::post::update_description(&state.database, post.id, &description).await?;
	}

	let post = reload(&state.database, auth.id(), post.id).await?;

	Ok(reply(Data::new(post)))
}

/// Delete post
/// Deletes a post. Only the author can delete a post. Deleting a missing post succeeds.
#[route(tag = tag::POST, response(status = 204, description = "Post deleted."))]
pub async fn delete_post(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::PostPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	if let Some(post) = db::post::find(&database, auth.id(), path.post).await? {
		policy::ensure_author("post", "delete", auth.id(), post.user_id).map_err(Error::Policy)?;

		db::post::soft_delete(&database, post.id).await?;

		tracing::info!(post = %post.id, "post deleted");
	}

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Like post
/// Likes a post, returning it with the new like count. A post can only be liked once.
#[route(tag = tag::POST)]
pub async fn like_post(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::PostPath>,
) -> Result<Reply<Data<model::Post>>, RouteError> {
	let post = visible_post(&database, auth.id(), path.post).await?;

	like::insert(&database, like::Target::Post(post.id), auth.id())
		.await
		.map_err(|e| {
			if db::is_unique_violation(&e) {
				Error::AlreadyLiked(post.id).into()
			} else {
				RouteError::from(e)
			}
		})?;

	let post = reload(&database, auth.id(), post.id).await?;

	Ok(reply(Data::new(post)))
}

/// Unlike post
/// Removes the requester's like from a post, returning the post. Unliking a post that was not liked succeeds.
#[route(tag = tag::POST)]
pub async fn unlike_post(
	State(database): State<Database>,
	auth: Auth,
	Path(path): Path<model::PostPath>,
) -> Result<Reply<Data<model::Post>>, RouteError> {
	let post = visible_post(&database, auth.id(), path.post).await?;

	like::delete(&database, like::Target::Post(post.id), auth.id()).await?;

	let post = reload(&database, auth.id(), post.id).await?;

	Ok(reply(Data::new(post)))
}
