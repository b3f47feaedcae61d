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

pub mod assemble;
pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("post already liked")]
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
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/count", get_with(count_posts, count_posts_docs))
		.api_route(
			"/:post",
			get_with(get_post, get_post_docs)
				.patch_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route(
			"/:post/like",
			post_with(like_post, like_post_docs).delete_with(unlike_post, unlike_post_docs),
		)
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
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
			Self::AlreadyLiked(post) => error::Message::new("already_liked")
				.detail("post", post)
				.into_vec(),
			Self::Visibility(error) => error.errors(),
			Self::Policy(error) => error.errors(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	fn descriptions(body: &Value) -> Vec<String> {
		body["data"]
			.as_array()
			.unwrap()
			.iter()
			.map(|post| post["description"].as_str().unwrap().to_owned())
			.collect()
	}

	#[sqlx::test]
	async fn test_post_lifecycle(pool: Database) {
		let app = app(pool);
		let (_, ann) = register(&app, "ann").await;
		let (_, bob) = register(&app, "bob").await;

		let post = create_post(&app, &ann, "first").await;

		let response = app.get(&format!("/api/v1/posts/{post}")).bearer(&bob).await;
		let body = response.json::<Value>();

		assert_eq!(body["data"]["user"]["username"], "ann");
		assert_eq!(body["data"]["likes"], 0);
		assert_eq!(body["data"]["comments"], json!([]));

		let response = app
			.patch(&format!("/api/v1/posts/{post}"))
			.bearer(&bob)
			.json(&json!({ "description": "mine now" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.patch(&format!("/api/v1/posts/{post}"))
			.bearer(&ann)
			.json(&json!({ "description": "edited" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["data"]["description"], "edited");

		let response = app.delete(&format!("/api/v1/posts/{post}")).bearer(&bob).await;

		assert_eq!(response.status_code(), 403);

		for _ in 0..2 {
			let response = app.delete(&format!("/api/v1/posts/{post}")).bearer(&ann).await;

			assert_eq!(response.status_code(), 204);
		}

		let response = app.get(&format!("/api/v1/posts/{post}")).bearer(&ann).await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	async fn test_like_twice(pool: Database) {
		let app = app(pool);
		let (_, ann) = register(&app, "ann").await;
		let post = create_post(&app, &ann, "likeable").await;

		let like = || app.post(&format!("/api/v1/posts/{post}/like")).bearer(&ann);

		let response = like().await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["data"]["likes"], 1);
		assert_eq!(response.json::<Value>()["data"]["liked"], true);

		assert_eq!(like().await.status_code(), 409);

		for _ in 0..2 {
			let response = app
				.delete(&format!("/api/v1/posts/{post}/like"))
				.bearer(&ann)
				.await;

			assert_eq!(response.status_code(), 200);
			assert_eq!(response.json::<Value>()["data"]["likes"], 0);
		}
	}

	#[sqlx::test]
	async fn test_pagination(pool: Database) {
		let app = app(pool);
		let (_, ann) = register(&app, "ann").await;

		for i in 0..5 {
			create_post(&app, &ann, &i.to_string()).await;
		}

		let mut seen = Vec::new();
		let mut cursor: Option<(String, String)> = None;

		loop {
			let mut request = app.get("/api/v1/posts").bearer(&ann).add_query_param("count", 2);

			if let Some((created_at, id)) = &cursor {
				request = request
					.add_query_param("last_seen_post_created_at", created_at)
					.add_query_param("last_seen_post_id", id);
			}

			let body = request.await.json::<Value>();
			let page = descriptions(&body);

			seen.extend(page.iter().cloned());

			if page.len() < 2 {
				break;
			}

			let last = &body["data"][1];

			cursor = Some((
				last["created_at"].as_str().unwrap().to_owned(),
				last["id"].as_str().unwrap().to_owned(),
			));
		}

		assert_eq!(seen, ["4", "3", "2", "1", "0"]);

		let response = app.get("/api/v1/posts/count").bearer(&ann).await;

		assert_eq!(response.json::<Value>()["count"], 5);
	}

	#[sqlx::test]
	async fn test_block_hides_posts(pool: Database) {
		let app = app(pool);
		let ann = register(&app, "ann").await;
		let bob = register(&app, "bob").await;

		create_post(&app, &ann.1, "by ann").await;
		relate(&app, &bob, ann.0, "following").await;

		let response = app
			.get("/api/v1/posts")
			.bearer(&bob.1)
			.add_query_param("type", "subscriptions")
			.await;

		assert_eq!(descriptions(&response.json::<Value>()), ["by ann"]);

		relate(&app, &ann, bob.0, "blocked").await;

		let response = app
			.get("/api/v1/posts")
			.bearer(&bob.1)
			.add_query_param("type", "user")
			.add_query_param("user_id", ann.0)
			.await;

		assert_eq!(response.status_code(), 403);

		// the follow row still exists, but the block wins
		let response = app
			.get("/api/v1/posts")
			.bearer(&bob.1)
			.add_query_param("type", "subscriptions")
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["count"], 0);

		let response = app
			.get("/api/v1/posts/count")
			.bearer(&bob.1)
			.add_query_param("type", "subscriptions")
			.await;

		assert_eq!(response.json::<Value>()["count"], 0);
	}

	#[sqlx::test]
	async fn test_invalid_filters(pool: Database) {
		let app = app(pool);
		let (me, token) = register(&app, "ann").await;

		let response = app
			.get("/api/v1/posts")
			.bearer(&token)
			.add_query_param("type", "friends")
			.await;

		assert_eq!(response.status_code(), 400);

		let response = app
			.get("/api/v1/posts")
			.bearer(&token)
			.add_query_param("type", "user")
			.await;

		assert_eq!(response.status_code(), 400);

		let response = app
			.get("/api/v1/posts")
			.bearer(&token)
			.add_query_param("type", "user")
			.add_query_param("user_id", me)
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	async fn test_non_author_is_forbidden_whatever_the_body(pool: Database) {
		let app = app(pool);
		let (_, ann) = register(&app, "ann").await;
		let (_, bob) = register(&app, "bob").await;
		let post = create_post(&app, &ann, "first").await;
		let long = "y".repeat(3000);

		let response = app
			.patch(&format!("/api/v1/posts/{post}"))
			.bearer(&bob)
			.json(&json!({ "description": long }))
			.await;

		assert_eq!(response.status_code(), 403);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "not_author");

		let response = app
			.patch(&format!("/api/v1/posts/{post}"))
			.bearer(&ann)
			.json(&json!({ "description": long }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "description");
	}

	#[sqlx::test]
	async fn test_edit_window_expired(pool: Database) {
		let app = app(pool.clone());
		let (_, ann) = register(&app, "ann").await;
		let post = create_post(&app, &ann, "old").await;

		sqlx::query("UPDATE post SET created_at = now() - interval '25 hours' WHERE id = $1::uuid")
			.bind(&post)
			.execute(&pool)
			.await
			.unwrap();

		let response = app
			.patch(&format!("/api/v1/posts/{post}"))
			.bearer(&ann)
			.json(&json!({ "description": "too late" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let body = response.json::<Value>();

		assert_eq!(body["errors"][0]["content"], "edit_window_expired");
		assert_eq!(body["errors"][0]["details"]["window_seconds"], 24 * 60 * 60);

		let response = app.get(&format!("/api/v1/posts/{post}")).bearer(&ann).await;

		assert_eq!(response.json::<Value>()["data"]["description"], "old");

		// deleting has no window
		let response = app.delete(&format!("/api/v1/posts/{post}")).bearer(&ann).await;

		assert_eq!(response.status_code(), 204);
	}

	#[sqlx::test]
	async fn test_subscriptions_of_unrelated_user(pool: Database) {
		let app = app(pool);
		let ann = register(&app, "ann").await;
		let bob = register(&app, "bob").await;
		let (_, carl) = register(&app, "carl").await;

		create_post(&app, &ann.1, "by ann").await;
		relate(&app, &bob, ann.0, "following").await;

		let response = app
			.get("/api/v1/posts")
			.bearer(&carl)
			.add_query_param("type", "subscriptions")
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["data"], json!([]));

		let response = app
			.get("/api/v1/posts")
			.bearer(&bob.1)
			.add_query_param("type", "subscriptions")
			.await;

		assert_eq!(descriptions(&response.json::<Value>()), ["by ann"]);
	}
}
