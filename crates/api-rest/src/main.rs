//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI) over an empty in-memory directory. The workspace's main `clindex-run`
//! binary loads `.env` files first, then starts the same router.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use api_shared::BearerTokens;
use clindex_core::{geocode_config_from_env_values, CoreConfig, MemoryStore, NominatimClient};

/// Main entry point for the clindex REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
/// Provides HTTP endpoints for clinic directory operations with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `CLINDEX_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINDEX_API_TOKENS`: Comma-separated `token:user` pairs accepted on write routes
/// - `CLINDEX_GEOCODE_URL`, `CLINDEX_GEOCODE_COUNTRY`, `CLINDEX_GEOCODE_USER_AGENT`,
///   `CLINDEX_GEOCODE_TIMEOUT_SECS`: forward geocoding settings
///
/// # Returns
/// * `Ok(())` - If server starts and runs successfully
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the geocoding configuration or token specification is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINDEX_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting clindex REST API on {}", addr);

    let geocode = geocode_config_from_env_values(
        std::env::var("CLINDEX_GEOCODE_URL").ok(),
        std::env::var("CLINDEX_GEOCODE_COUNTRY").ok(),
        std::env::var("CLINDEX_GEOCODE_USER_AGENT").ok(),
        std::env::var("CLINDEX_GEOCODE_TIMEOUT_SECS").ok(),
    )?;
    let cfg = Arc::new(CoreConfig::new(geocode)?);

    let tokens = BearerTokens::from_env()?;
    if tokens.is_empty() {
        tracing::warn!("CLINDEX_API_TOKENS is not set; write routes will reject every request");
    }

    let geocoder = Arc::new(NominatimClient::new(cfg.geocode().clone()));
    let state = AppState::new(cfg, Arc::new(MemoryStore::new()), geocoder, tokens);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
