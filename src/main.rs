use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use frontdesk::config::AppConfig;
use frontdesk::handlers;
use frontdesk::services::clock::SystemClock;
use frontdesk::services::front_desk::FrontDesk;
use frontdesk::services::store::sqlite::SqliteStore;
use frontdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.admin_token == "changeme" {
        tracing::warn!("ADMIN_TOKEN is still the default, set it before exposing the desk");
    }

    let store = Arc::new(SqliteStore::open(&config.database_url)?);
    tracing::info!("using database {}", config.database_url);

    let desk = FrontDesk::load(store.clone(), store, Arc::new(SystemClock)).await?;

    let state = Arc::new(AppState {
        desk,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings/:id/balance", get(handlers::bookings::get_balance))
        .route("/api/bookings/:id/status", post(handlers::bookings::change_status))
        .route("/api/bookings/:id/approve", post(handlers::bookings::approve))
        .route("/api/bookings/:id/cancel", post(handlers::bookings::cancel))
        .route("/api/bookings/:id/checkout", post(handlers::bookings::check_out))
        .route(
            "/api/bookings/:id/extension/rooms",
            get(handlers::extensions::get_rooms),
        )
        .route(
            "/api/bookings/:id/extension/quote",
            post(handlers::extensions::quote),
        )
        .route("/api/bookings/:id/extension", post(handlers::extensions::extend))
        .route("/api/rooms/:id/occupancy", get(handlers::visitors::get_occupancy))
        .route("/api/rooms/:id/visitors", post(handlers::visitors::add_visitor))
        .route("/api/visitors/:id/status", post(handlers::visitors::set_status))
        .route("/api/visitors/:id/checkout", post(handlers::visitors::check_out))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
