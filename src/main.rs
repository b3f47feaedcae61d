#![warn(clippy::pedantic)]

mod config;
mod db;
mod error;
mod extract;
mod media;
mod openapi;
mod pagination;
mod password;
mod policy;
mod route;
mod token;
mod visibility;

use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{extract::Request, Extension, Router, ServiceExt};
use tower::{Layer, ServiceBuilder};
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::Config, media::Storage, token::Keys};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Everything in here is either a handle (the pool) or immutable after
/// startup, so handlers never coordinate with each other.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub keys: Arc<Keys>,
	pub storage: Arc<Storage>,
	pub config: Arc<Config>,
}

impl State {
	pub fn new(database: Database, config: Config) -> Self {
		Self {
			database,
			hasher: Argon2::default(),
			keys: Arc::new(Keys::new(config.jwt_secret.as_bytes(), config.jwt_expiry)),
			storage: Arc::new(Storage::new(config.data_path.clone(), config.image_quality)),
			config: Arc::new(config),
		}
	}
}

/// Builds the application router, with the API under `/api/v1`.
pub fn app(state: State) -> Router {
	let mut api = OpenApi::default();
	let mut router = ApiRouter::new().nest("/api/v1", route::routes());

	if state.config.enable_docs {
		router = router.nest("/docs", route::docs::routes());
	}

	router
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	aide::gen::on_error(|error| tracing::error!(%error, "failed to generate api docs"));
	aide::gen::extract_schemas(true);

	let config = Config::load();
	let (host, port) = (config.host.clone(), config.port);

	let database = db::connect(&config.database)
		.await
		.expect("failed to connect to database");

	let app = NormalizePathLayer::trim_trailing_slash().layer(app(State::new(database, config)));

	let listener = tokio::net::TcpListener::bind((host.as_str(), port))
		.await
		.expect("failed to bind to address");

	tracing::info!("listening on {host}:{port}");

	axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
		.await
		.expect("server error");
}
