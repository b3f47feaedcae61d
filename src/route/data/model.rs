use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct FilePath {
	/// The base type of the file, e.g. `image`.
	pub kind: String,
	/// The file name returned by the upload route.
	pub name: String,
}

/// Optional bounds to scale an image down to. Images are never enlarged.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct SizeQuery {
	#[validate(range(min = 1, max = 4096))]
	pub width: Option<u32>,
	#[validate(range(min = 1, max = 4096))]
	pub height: Option<u32>,
}
