//! Donation Campaign Backend
//!
//! Serves the campaign counter, the message board, the admin gate and the map
//! link resolver. Records live in a hosted store with a local JSON fallback.

mod api;
mod auth;
mod campaign;
mod config;
mod errors;
mod map;
mod messages;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::AdminGate;
use campaign::CampaignResolver;
use config::Config;
use map::MapResolver;
use messages::MessageBoard;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub campaign: Arc<CampaignResolver>,
    pub messages: Arc<MessageBoard>,
    pub maps: Arc<MapResolver>,
    pub gate: Arc<AdminGate>,
}

impl AppState {
    /// Wire every component from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::new();

        Ok(Self {
            campaign: Arc::new(CampaignResolver::from_config(&config.storage, &client)),
            messages: Arc::new(MessageBoard::from_config(&config.storage, &client)),
            maps: Arc::new(MapResolver::new(
                config.map_fetch_timeout,
                config.default_location.clone(),
            )?),
            gate: Arc::new(AdminGate::new(config.admin_password.clone())),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting Donation Campaign Backend");
    tracing::info!("Local data directory: {:?}", config.storage.data_dir);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        remote_reads = config.storage.remote_read().is_some(),
        remote_writes = config.storage.remote_write().is_some(),
        "Store configuration"
    );

    if config.uses_default_password() {
        tracing::warn!("ADMIN_PASSWORD is not set. Using the insecure default admin password!");
    }

    let state = AppState::from_config(&config)?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Campaign
        .route(
            "/campaign",
            get(api::get_campaign)
                .post(api::update_campaign)
                .fallback(api::method_not_allowed),
        )
        .route(
            "/campaign/get",
            get(api::get_campaign).fallback(api::method_not_allowed),
        )
        .route(
            "/campaign/update",
            post(api::update_campaign).fallback(api::method_not_allowed),
        )
        // Admin
        .route(
            "/admin/validate",
            post(api::validate_admin).fallback(api::method_not_allowed),
        )
        // Map
        .route(
            "/map/resolve",
            get(api::resolve_map).fallback(api::method_not_allowed),
        )
        // Messages
        .route(
            "/messages",
            get(api::list_messages)
                .post(api::create_message)
                .fallback(api::method_not_allowed),
        )
        .route(
            "/messages/list",
            get(api::list_messages).fallback(api::method_not_allowed),
        )
        .route(
            "/messages/create",
            post(api::create_message).fallback(api::method_not_allowed),
        );

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
