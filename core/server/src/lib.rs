//! HTTP relay server for DriveRelay.
//!
//! Exposes the authentication endpoints (code exchange, refresh, logout,
//! revoke) and the Drive proxy endpoints (list, streaming download) behind
//! a CORS boundary scoped to a single browser origin. The refresh
//! credential lives exclusively in an httpOnly cookie set and read here;
//! it is never part of a response body.

pub mod config;
pub mod cookies;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::info;

use driverelay_auth::{AuthConfig, AuthRelay};
use driverelay_common::{Error, Result};
use driverelay_drive::DriveRelay;

/// Run the relay until the process is stopped.
///
/// Binds the configured port, wires the credential and Drive relays, and
/// applies the CORS policy for the configured browser origin.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let auth = AuthRelay::new(AuthConfig::new(&config.client_id, &config.client_secret));
    let state = AppState::new(auth, DriveRelay::new(), config.production);

    let origin = config
        .origin_url
        .parse::<HeaderValue>()
        .map_err(|e| Error::Config(format!("Invalid ORIGIN_URL: {e}")))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = routes::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        port = config.port,
        origin = %config.origin_url,
        production = config.production,
        "relay listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
