use argon2::{
	password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};
use uuid::Uuid;

/// Hashes a password with Argon2 into a PHC string.
///
/// Every hash gets a fresh random salt, so the same password never hashes
/// to the same string twice.
pub fn hash(hasher: &Argon2, password: &str) -> Result<String, password_hash::Error> {
	let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;

	Ok(hasher
		.hash_password(password.as_bytes(), &salt)?
		.to_string())
}

/// Checks a password against a stored PHC string.
///
/// Comparison is done by the hasher itself in constant time. A wrong
/// password is `Ok(false)`, a malformed hash is an error.
pub fn verify(hasher: &Argon2, password: &str, hash: &str) -> Result<bool, password_hash::Error> {
	let parsed = PasswordHash::new(hash)?;

	match hasher.verify_password(password.as_bytes(), &parsed) {
		Ok(()) => Ok(true),
		Err(password_hash::Error::Password) => Ok(false),
		Err(e) => Err(e),
	}
}
