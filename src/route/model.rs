use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::extract::Json;

/// The body of every successful response.
///
/// The payload's fields sit next to `error` and `message` rather than
/// under a key of their own.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Envelope<T> {
	/// Always `false` on success.
	pub error: bool,
	pub message: Option<String>,
	#[serde(flatten)]
	pub data: T,
}

pub type Reply<T> = Json<Envelope<T>>;

pub fn reply<T>(data: T) -> Reply<T> {
	Json(Envelope {
		error: false,
		message: None,
		data,
	})
}

/// A single item, under `data`.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Data<T> {
	pub data: T,
}

impl<T> Data<T> {
	pub fn new(data: T) -> Self {
		Self { data }
	}
}

/// One page of a list, newest first.
///
/// A page holding fewer items than were asked for is the last one.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	/// The number of items in this page.
	pub count: usize,
	pub data: Vec<T>,
}

impl<T> Page<T> {
	pub fn new(data: Vec<T>) -> Self {
		Self {
			count: data.len(),
			data,
		}
	}
}

/// A total number of items.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Count {
	pub count: i64,
}

/// Deserializes an optional string, treating `""` as absent.
///
/// Used by partial updates, where only non-empty fields overwrite
/// stored values.
pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.filter(|value| !value.is_empty()))
}
