use aide::{
	openapi::{MediaType, ReferenceOr, RequestBody},
	OperationInput,
};
use axum::extract::{FromRequest, Multipart, Request};
use validator::{ValidationError, ValidationErrors};

use crate::error::AppError;

/// The multipart field an upload is read from.
pub const FIELD: &str = "file";

/// A single file sent as the `file` field of a `multipart/form-data` body.
///
/// Other fields are ignored. The content type is the one the client
/// declared for the part, it is not sniffed from the bytes.
#[derive(Debug)]
pub struct Upload {
	pub content_type: String,
	pub bytes: Vec<u8>,
}

#[axum::async_trait]
impl<S> FromRequest<S> for Upload
where
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let mut multipart = Multipart::from_request(req, state).await?;

		while let Some(field) = multipart.next_field().await? {
			if field.name() != Some(FIELD) {
				continue;
			}

			let content_type = field.content_type().unwrap_or_default().to_owned();
			let bytes = field.bytes().await?.to_vec();

			return Ok(Self {
				content_type,
				bytes,
			});
		}

		let mut errors = ValidationErrors::new();
		let mut error = ValidationError::new("required");
		error.message = Some("a file field is required".into());
		errors.add(FIELD, error);

		Err(AppError::Validation(errors))
	}
}

impl OperationInput for Upload {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		let mut body = RequestBody {
			description: Some(format!("A single file in the `{FIELD}` field.")),
			required: true,
			..Default::default()
		};

		body.content
			.insert("multipart/form-data".into(), MediaType::default());

		operation.request_body = Some(ReferenceOr::Item(body));
	}
}
