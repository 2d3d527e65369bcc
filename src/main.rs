/// Project Management API
///
/// Main entry point. Loads configuration from the environment and starts the
/// HTTP server once the database is ready.

use pmapi::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Liveness at /
/// - Database health at /health and /status
///
/// Exits non-zero if configuration is incomplete or the database never
/// becomes reachable.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    start_server(config).await?;

    Ok(())
}
