use aide::axum::ApiRouter;

use crate::AppState;

pub mod auth;
pub mod comment;
pub mod data;
pub mod docs;
pub mod model;
pub mod post;
pub mod relation;
pub mod user;

/// Every API route, to be nested under the version prefix.
pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.merge(auth::routes())
		.nest("/users", user::routes().merge(relation::routes()))
		.nest("/posts", post::routes().merge(comment::routes()))
		.nest("/data", data::routes())
}
