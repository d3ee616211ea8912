use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use api_shared::BearerTokens;
use clindex_core::{geocode_config_from_env_values, CoreConfig, MemoryStore, NominatimClient};

/// Main entry point for the clindex application
///
/// Starts the clinic directory REST server on port 3000 (configurable via
/// CLINDEX_REST_ADDR). The server exposes directory listing, criteria and
/// radius search, nearest-first lookup, forward geocoding and the review
/// subsystem over one in-memory directory. Reads are open; writes require a
/// bearer token.
///
/// # Environment Variables
/// - `CLINDEX_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINDEX_API_TOKENS`: Comma-separated `token:user` pairs for write routes
/// - `CLINDEX_GEOCODE_URL`: Nominatim-compatible search endpoint
/// - `CLINDEX_GEOCODE_COUNTRY`: Comma-separated country codes for geocoding
/// - `CLINDEX_GEOCODE_USER_AGENT`: User-Agent header on geocoding requests
/// - `CLINDEX_GEOCODE_TIMEOUT_SECS`: Geocoding timeout in seconds
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clindex=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINDEX_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting clindex REST on {}", rest_addr);

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

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
