use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: String,
	pub port: u16,
	pub database: DatabaseConfig,
	pub jwt_secret: String,
	/// How long an issued access token stays valid.
	pub jwt_expiry: chrono::Duration,
	/// Root directory for uploaded media.
	pub data_path: PathBuf,
	/// JPEG quality used when re-encoding uploaded images.
	pub image_quality: u8,
	/// How long after creation a post or comment can still be edited.
	pub edit_window: chrono::Duration,
	pub enable_docs: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub url: String,
	pub max_connections: u32,
	pub min_connections: u32,
	pub max_lifetime: Duration,
}

impl Config {
	/// Loads the configuration from environment variables.
	///
	/// Panics on values that are present but malformed, since the service
	/// cannot start in a sane state with them.
	pub fn load() -> Self {
		Self {
			host: try_load("HOST", "127.0.0.1"),
			port: try_load("PORT", "3000"),
			database: DatabaseConfig {
				url: database_url(),
				max_connections: try_load("DB_MAX_CONNECTIONS", "10"),
				min_connections: try_load("DB_MIN_CONNECTIONS", "0"),
				max_lifetime: Duration::from_secs(try_load("DB_MAX_LIFETIME_SECONDS", "1800")),
			},
			jwt_secret: required("JWT_SECRET_KEY"),
			jwt_expiry: chrono::Duration::minutes(try_load("JWT_EXPIRE_MINUTES", "1440")),
			data_path: try_load("DATA_PATH", "data"),
			image_quality: try_load("IMAGE_QUALITY", "80"),
			edit_window: chrono::Duration::hours(try_load("EDIT_WINDOW_HOURS", "24")),
			enable_docs: try_load("ENABLE_DOCS", "true"),
		}
	}
}

fn var(key: &str) -> Option<String> {
	env::var(key).ok().filter(|value| !value.is_empty())
}

fn required(key: &str) -> String {
	var(key).unwrap_or_else(|| panic!("{key} must be set"))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
	T::Err: Display,
{
	var(key)
		.unwrap_or_else(|| {
			info!("{key} not set, using default: {default}");
			default.to_string()
		})
		.parse()
		.map_err(|e| {
			warn!("invalid {key} value: {e}");
		})
		.expect("environment misconfigured")
}

/// Uses `DATABASE_URL` when present, otherwise assembles one from the
/// individual `DB_*` variables.
fn database_url() -> String {
	if let Some(url) = var("DATABASE_URL") {
		return url;
	}

	compose_database_url(
		&try_load::<String>("DB_USER", "postgres"),
		&var("DB_PASSWORD").unwrap_or_default(),
		&try_load::<String>("DB_HOST", "localhost"),
		try_load("DB_PORT", "5432"),
		&try_load::<String>("DB_NAME", "diverse"),
	)
}

fn compose_database_url(user: &str, password: &str, host: &str, port: u16, name: &str) -> String {
	if password.is_empty() {
		format!("postgres://{user}@{host}:{port}/{name}")
	} else {
		format!("postgres://{user}:{password}@{host}:{port}/{name}")
	}
}

#[cfg(test)]
impl Config {
	/// A configuration for tests that never touches the environment.
	pub fn test() -> Self {
		Self {
			host: "127.0.0.1".into(),
			port: 0,
			database: DatabaseConfig {
				url: String::new(),
				max_connections: 1,
				min_connections: 0,
				max_lifetime: Duration::from_secs(60),
			},
			jwt_secret: "test-secret".into(),
			jwt_expiry: chrono::Duration::minutes(5),
			data_path: env::temp_dir().join("diverse-test-data"),
			image_quality: 80,
			edit_window: chrono::Duration::hours(24),
			enable_docs: false,
		}
	}
}
