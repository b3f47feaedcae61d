use aide::{
	openapi::{SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const USER: &str = "User";
	pub const RELATION: &str = "Relation";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const DATA: &str = "Data";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Diverse Open API")
		.summary("A social network backend")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("Registration and access tokens".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::USER.into(),
			description: Some("User profiles".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::RELATION.into(),
			description: Some("Follows and blocks between users".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Posts and post likes".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comments and comment likes".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::DATA.into(),
			description: Some("Uploaded media".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("JWT".into()),
				description: Some("An access token from /login, /register or /fetch".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorBody<'static>>, _>(|res| {
			res.example(error::ErrorBody {
				error: true,
				message: "summary of the error".into(),
				errors: error::Message::new("error message")
					.field("optional field")
					.detail("key", "value")
					.into_vec(),
			})
		})
}
