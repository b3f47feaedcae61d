use chrono::{DateTime, Utc};
use jsonwebtoken::{errors, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// The user the token was issued for.
	pub id: Uuid,
	pub iat: i64,
	pub exp: i64,
}

/// Signing and verification keys for HS256 access tokens.
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	expiry: chrono::Duration,
}

impl Keys {
	pub fn new(secret: &[u8], expiry: chrono::Duration) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation: Validation::new(Algorithm::HS256),
			expiry,
		}
	}

	/// Issues a token for `id`, valid from now until the configured expiry.
	pub fn issue(&self, id: Uuid) -> Result<String, errors::Error> {
		self.issue_at(id, Utc::now())
	}

	pub fn issue_at(&self, id: Uuid, now: DateTime<Utc>) -> Result<String, errors::Error> {
		let claims = Claims {
			id,
			iat: now.timestamp(),
			exp: (now + self.expiry).timestamp(),
		};

		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
	}

	/// Verifies the signature and expiry of a token, returning its claims.
	pub fn verify(&self, token: &str) -> Result<Claims, errors::Error> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
	}
}
