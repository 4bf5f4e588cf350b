//! qrscan-gateway - REST gateway for the QR-scan web service and ServiceDesk Plus
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `ZOHO_BASE_URL`: Base URL of the ServiceDesk Plus API
//! - `ZOHO_CLIENT_ID`, `ZOHO_CLIENT_SECRET`, `ZOHO_REFRESH_TOKEN`: OAuth credentials
//!
//! # Usage
//!
//! ```bash
//! # Direct execution
//! ./qrscan-gateway
//!
//! # On another port, without the /api prefix
//! PORT=9000 API_PREFIX=/ ./qrscan-gateway
//! ```

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{fmt, EnvFilter};

use qrscan_gateway::api::{self, AppState};
use qrscan_gateway::config::Config;
use qrscan_gateway::sdp_client::SdpClient;
use qrscan_gateway::soap::SoapClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("qrscan_gateway=info")),
        )
        .init();

    tracing::info!("Starting qrscan-gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::debug!(?config, "Configuration loaded");

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create uploads directory {}",
                config.uploads_dir.display()
            )
        })?;

    let soap = SoapClient::new(&config).context("Failed to create SOAP client")?;
    let sdp = SdpClient::new(&config).context("Failed to create SDP client")?;

    let app = api::router(AppState::new(soap, sdp), &config.api_prefix);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(
        address = %address,
        prefix = %config.api_prefix,
        "Server running, waiting for requests"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error during operation")?;

    tracing::info!("Server shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
