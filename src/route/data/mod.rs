use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::{extract::DefaultBodyLimit, http::StatusCode};

use crate::{error, media, AppState};

pub mod model;
pub mod route;

/// The largest request body accepted by the upload route.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown file")]
	UnknownFile,
	#[error(transparent)]
	Media(#[from] media::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", post_with(upload, upload_docs))
		.api_route("/:kind/:name", get_with(get_file, get_file_docs))
		.layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownFile => StatusCode::NOT_FOUND,
			Self::Media(media::Error::UnsupportedMediaType(..)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
			Self::Media(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::UnknownFile => error::Message::new("unknown_file").into_vec(),
			Self::Media(media::Error::UnsupportedMediaType(content_type)) => {
				error::Message::new("unsupported_media_type")
					.field("file")
					.detail("content_type", content_type)
					.detail("allowed", media::ALLOWED_BASE_TYPES)
					.into_vec()
			}
			Self::Media(..) => Vec::new(),
		}
	}
}

#[cfg(test)]
mod test {
	use axum_test::multipart::{MultipartForm, Part};

	use crate::test::*;

	#[sqlx::test]
	async fn test_upload_and_serve(pool: Database) {
		let app = app(pool);
		let (_, token) = register(&app, "ann").await;

		let path = upload(&app, &token).await;

		assert!(path.starts_with("/data/image/"));

		let response = app.get(&format!("/api/v1{path}")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.header("content-type"), "image/jpeg");
		assert_eq!(&response.as_bytes()[..2], &[0xFF, 0xD8]);

		let response = app
			.get(&format!("/api/v1{path}"))
			.add_query_param("width", 4)
			.await;

		let image = image::load_from_memory(response.as_bytes()).unwrap();

		assert_eq!((image.width(), image.height()), (4, 4));

		let response = app
			.get(&format!("/api/v1{path}"))
			.add_query_param("width", 0)
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[sqlx::test]
	async fn test_upload_rejects_other_types(pool: Database) {
		let app = app(pool);
		let (_, token) = register(&app, "ann").await;

		let form = MultipartForm::new().add_part(
			"file",
			Part::bytes(b"hello".to_vec())
				.file_name("hello.txt")
				.mime_type("text/plain"),
		);

		let response = app.post("/api/v1/data").bearer(&token).multipart(form).await;

		assert_eq!(response.status_code(), 415);

		let form = MultipartForm::new().add_text("other", "value");
		let response = app.post("/api/v1/data").bearer(&token).multipart(form).await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "file");
	}

	#[sqlx::test]
	async fn test_unknown_file(pool: Database) {
		let app = app(pool);

		let response = app
			.get(&format!("/api/v1/data/image/{}", crate::media::file_name()))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(app.get("/api/v1/data/image/..%2F..%2Fetc").await.status_code(), 404);
		assert_eq!(app.post("/api/v1/data").await.status_code(), 401);
	}
}
