//! Uploaded media storage.
//!
//! Files live under `<root>/<base type>/<name>`, where the name is a dash-less
//! v4 UUID. Images are always re-encoded to JPEG before they are written, so a
//! stored file is never the bytes a client sent.

use std::{io, path::PathBuf};

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageError};
use uuid::Uuid;

/// MIME base types accepted for upload.
pub const ALLOWED_BASE_TYPES: &[&str] = &["image"];

/// The content type every stored image is served with.
pub const STORED_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unsupported media type {0:?}")]
	UnsupportedMediaType(String),
	#[error("failed to process image")]
	Image(#[from] ImageError),
	#[error("failed to access storage")]
	Io(#[from] io::Error),
	#[error("image task failed")]
	Task(#[from] tokio::task::JoinError),
}

/// Returns the allowed base type of a MIME type, e.g. `image` for `image/png`.
pub fn base_type(content_type: &str) -> Result<&'static str, Error> {
	let unsupported = || Error::UnsupportedMediaType(content_type.to_owned());

	let essence = content_type.split(';').next().unwrap_or_default().trim();
	let (base, sub) = essence.split_once('/').ok_or_else(unsupported)?;

	if sub.is_empty() {
		return Err(unsupported());
	}

	ALLOWED_BASE_TYPES
		.iter()
		.find(|allowed| allowed.eq_ignore_ascii_case(base))
		.copied()
		.ok_or_else(unsupported)
}

pub fn file_name() -> String {
	Uuid::new_v4().simple().to_string()
}

/// Whether `name` could have been produced by [`file_name`].
pub fn is_file_name(name: &str) -> bool {
	name.len() == 32
		&& name
			.bytes()
			.all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Scales an image down to fit inside `width` by `height`, keeping its
/// aspect ratio. Images are never enlarged.
pub fn fit(image: DynamicImage, width: Option<u32>, height: Option<u32>) -> DynamicImage {
	let (current_width, current_height) = (image.width(), image.height());
	let width = width.map_or(current_width, |w| w.min(current_width));
	let height = height.map_or(current_height, |h| h.min(current_height));

	if width == current_width && height == current_height {
		return image;
	}

	image.resize(width, height, FilterType::Lanczos3)
}

pub fn encode(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
	let mut out = Vec::new();

	image
		.to_rgb8()
		.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;

	Ok(out)
}

/// Decodes any supported image format and re-encodes it as JPEG.
pub fn convert(bytes: &[u8], quality: u8) -> Result<Vec<u8>, ImageError> {
	encode(&image::load_from_memory(bytes)?, quality)
}

/// Local media storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct Storage {
	root: PathBuf,
	quality: u8,
}

impl Storage {
	pub fn new(root: impl Into<PathBuf>, quality: u8) -> Self {
		Self {
			root: root.into(),
			quality,
		}
	}

	/// Converts and stores an upload, returning its public path.
	pub async fn store(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, Error> {
		let base = base_type(content_type)?;
		let quality = self.quality;

		let encoded = tokio::task::spawn_blocking(move || convert(&bytes, quality)).await??;

		let directory = self.root.join(base);
		let name = file_name();

		tokio::fs::create_dir_all(&directory).await?;
		tokio::fs::write(directory.join(&name), encoded).await?;

		tracing::debug!(%base, %name, "stored upload");

		Ok(format!("/data/{base}/{name}"))
	}

	/// Reads a stored file, downscaling it when a size is requested.
	///
	/// Unknown base types and names that could not have been generated are
	/// reported as missing without touching the filesystem.
	pub async fn load(
		&self,
		base: &str,
		name: &str,
		width: Option<u32>,
		height: Option<u32>,
	) -> Result<Option<Vec<u8>>, Error> {
		if !ALLOWED_BASE_TYPES.contains(&base) || !is_file_name(name) {
			return Ok(None);
		}

		let bytes = match tokio::fs::read(self.root.join(base).join(name)).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		if width.is_none() && height.is_none() {
			return Ok(Some(bytes));
		}

		let quality = self.quality;
		let resized = tokio::task::spawn_blocking(move || {
			let image = image::load_from_memory(&bytes)?;

			encode(&fit(image, width, height), quality)
		})
		.await??;

		Ok(Some(resized))
	}
}

#[cfg(test)]
mod test {
	use std::io::Cursor;

	use image::{DynamicImage, ImageFormat};
	use uuid::Uuid;

	use super::*;

	fn png(width: u32, height: u32) -> Vec<u8> {
		let mut bytes = Vec::new();

		DynamicImage::new_rgb8(width, height)
			.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
			.unwrap();

		bytes
	}

	fn storage() -> Storage {
		Storage::new(
			std::env::temp_dir().join(format!("diverse-media-{}", Uuid::new_v4().simple())),
			80,
		)
	}

	#[test]
	fn test_base_type() {
		assert_eq!(base_type("image/png").unwrap(), "image");
		assert_eq!(base_type("IMAGE/jpeg; charset=binary").unwrap(), "image");

		assert!(matches!(
			base_type("video/mp4"),
			Err(Error::UnsupportedMediaType(t)) if t == "video/mp4"
		));
		assert!(base_type("image").is_err());
		assert!(base_type("image/").is_err());
		assert!(base_type("").is_err());
	}

	#[test]
	fn test_file_name() {
		let name = file_name();

		assert_eq!(name.len(), 32);
		assert!(!name.contains('-'));
		assert!(is_file_name(&name));
		assert_ne!(name, file_name());

		assert!(!is_file_name("../../etc/passwd"));
		assert!(!is_file_name(&Uuid::new_v4().to_string()));
	}

	#[test]
	fn test_convert_to_jpeg() {
		let jpeg = convert(&png(4, 4), 80).unwrap();

		assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
		assert!(convert(b"not an image", 80).is_err());
	}

	#[test]
	fn test_fit_never_enlarges() {
		let image = DynamicImage::new_rgb8(100, 50);

		let same = fit(image.clone(), Some(400), Some(400));
		assert_eq!((same.width(), same.height()), (100, 50));

		let smaller = fit(image.clone(), Some(50), None);
		assert_eq!((smaller.width(), smaller.height()), (50, 25));

		let bounded = fit(image, Some(80), Some(10));
		assert_eq!((bounded.width(), bounded.height()), (20, 10));
	}

	#[tokio::test]
	async fn test_store_and_load() {
		let storage = storage();

		let path = storage.store("image/png", png(40, 20)).await.unwrap();
		let name = path.rsplit('/').next().unwrap();

		assert!(path.starts_with("/data/image/"));

		let stored = storage.load("image", name, None, None).await.unwrap().unwrap();
		assert_eq!(&stored[..2], &[0xFF, 0xD8]);

		let resized = storage
			.load("image", name, Some(10), None)
			.await
			.unwrap()
			.unwrap();
		let decoded = image::load_from_memory(&resized).unwrap();
		assert_eq!((decoded.width(), decoded.height()), (10, 5));

		assert!(storage.load("image", &file_name(), None, None).await.unwrap().is_none());
		assert!(storage.load("video", name, None, None).await.unwrap().is_none());

		tokio::fs::remove_dir_all(&storage.root).await.unwrap();
	}

	#[tokio::test]
	async fn test_store_rejects_other_types() {
		let storage = storage();

		assert!(matches!(
			storage.store("text/plain", b"hello".to_vec()).await,
			Err(Error::UnsupportedMediaType(..))
		));
	}
}
