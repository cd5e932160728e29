// Minimal HTTP liveness endpoint for external process-health monitors.
//
// It only proves the process is up; it does not check the Discord gateway.

use axum::{routing::get, Router};
use tracing::{error, info};

pub const LIVENESS_BODY: &str = "Bot is running!";

pub fn router() -> Router {
    Router::new().route("/", get(liveness))
}

async fn liveness() -> &'static str {
    LIVENESS_BODY
}

/// Bind `0.0.0.0:port` and serve the liveness route in the background.
pub async fn spawn(port: u16) -> std::io::Result<()> {
    let address = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(bind_address = %address, "Liveness endpoint started");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router()).await {
            error!(error = %e, "Liveness endpoint terminated unexpectedly");
        }
    });

    Ok(())
}
