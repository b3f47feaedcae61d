use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
};
use macros::route;

use crate::{
	extract::{Auth, Path, Query, Upload},
	media::{self, Storage},
	openapi::tag,
	route::model::{reply, Data, Reply},
};

use super::{model, Error, RouteError};

/// Upload file
/// Uploads a single image in the `file` field of a multipart body, returning the path it is served from.
/// Images are re-encoded as JPEG before they are stored.
#[route(tag = tag::DATA, response(status = 201, shape = "Reply<Data<String>>", description = "File stored."))]
pub async fn upload(
	State(storage): State<Arc<Storage>>,
	auth: Auth,
	upload: Upload,
) -> Result<impl IntoApiResponse, RouteError> {
	let path = storage
		.store(&upload.content_type, upload.bytes)
		.await
		.map_err(Error::from)?;

	tracing::info!(user = %auth.id(), %path, "file uploaded");

	Ok((StatusCode::CREATED, reply(Data::new(path))))
}

/// Get file
/// Serves a stored file, optionally scaled down to fit `width` by `height`.
#[route(tag = tag::DATA, response(status = 200, description = "The file, as JPEG."))]
pub async fn get_file(
	State(storage): State<Arc<Storage>>,
	Path(path): Path<model::FilePath>,
	Query(query): Query<model::SizeQuery>,
) -> Result<impl IntoApiResponse, RouteError> {
	let bytes = storage
		.load(&path.kind, &path.name, query.width, query.height)
		.await
		.map_err(Error::from)?
		.ok_or(Error::UnknownFile)?;

	Ok(([(header::CONTENT_TYPE, media::STORED_CONTENT_TYPE)], bytes).into_response())
}

