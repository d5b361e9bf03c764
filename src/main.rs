mod config;
mod db;
mod dtos;
mod error;
mod extract;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::DBClient;
use dotenv::dotenv;
use routes::create_router;
use service::{
    bid_service::BidService, registration_service::RegistrationService,
    requirement_service::RequirementService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub requirement_service: Arc<RequirementService>,
    pub bid_service: Arc<BidService>,
    pub registration_service: Arc<RegistrationService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client = Arc::new(db_client);

        Self {
            env: config,
            requirement_service: Arc::new(RequirementService::new(db_client.clone())),
            bid_service: Arc::new(BidService::new(db_client.clone())),
            registration_service: Arc::new(RegistrationService::new(db_client.clone())),
            db_client,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!(error = ?err, "failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!(error = ?err, "failed to run migrations");
        std::process::exit(1);
    }

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]);

    let app_state = Arc::new(AppState::new(DBClient::new(pool), config.clone()));

    let app = create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = ?err, port = config.port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = ?err, "server error");
    }
}
