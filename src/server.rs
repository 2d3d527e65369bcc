/// Server setup and initialization
///
/// Composition root: builds the connection pool, waits for the database via the
/// startup sequencer, then wires the pool into the HTTP routes and serves them.

use crate::{
    api::{create_health_routes, AppState},
    config::Config,
    project::{ensure_schema, Database},
    startup::{RetryPolicy, StartupSequencer},
};
use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset
///
/// `TraceLayer` reports requests at debug level under the `tower_http` target.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Create the main Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(create_health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the pool and block until the schema is in place
///
/// Returns the ready pool, or the last bootstrap error once the retry budget
/// is exhausted.
pub async fn bootstrap_database(config: &Config) -> Result<Database> {
    tracing::info!(
        "📊 Connecting to DB at: {}:{}",
        config.database.host,
        config.database.port
    );

    let db = Database::from_config(&config.database)?;

    let policy = RetryPolicy::from(&config.startup);
    let pool = &db;
    let attempts = StartupSequencer::new(policy)
        .run(move |_| ensure_schema(pool))
        .await?;

    tracing::info!("✅ Database tables created successfully (attempt {})", attempts);
    Ok(db)
}

/// Start the HTTP server with the given configuration
///
/// Logging is initialized here; the listener is only bound once the database
/// has been bootstrapped.
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("🚀 Project Management API starting up");

    let db = bootstrap_database(&config).await?;
    let app = create_app(AppState::new(db.clone()));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server shut down");

    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ConfigError, project::DatabaseError, startup::StartupError};
    use axum::{body::Body, http::Request};
    use std::{
        collections::HashMap,
        io,
        sync::{Arc, Mutex},
    };
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn config(overrides: &[(&str, &str)]) -> Config {
        let mut env: HashMap<String, String> = [
            ("DB_HOST", "127.0.0.1"),
            // Nothing listens on port 1
            ("DB_PORT", "1"),
            ("DB_USER", "pm"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "projects"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "1"),
            ("DB_CONNECT_MAX_ATTEMPTS", "2"),
            ("DB_CONNECT_RETRY_DELAY_SECS", "0"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            env.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|name| env.get(name).cloned()).unwrap()
    }

    #[tokio::test]
    async fn bootstrap_fails_once_retries_run_out() {
        let err = bootstrap_database(&config(&[])).await.unwrap_err();

        let startup = err
            .downcast_ref::<StartupError<DatabaseError>>()
            .expect("startup error");
        assert_eq!(startup.attempts, 2);
        assert!(matches!(startup.source, DatabaseError::SchemaCreation(_)));
    }

    #[tokio::test]
    async fn bootstrap_rejects_unusable_connection_parameters() {
        let err = bootstrap_database(&config(&[("DB_HOST", "bad host")]))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DatabaseError>(),
            Some(DatabaseError::Config(ConfigError::Invalid { name: "DB_HOST", .. }))
        ));
    }

    #[tokio::test]
    async fn default_filter_logs_each_request() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(DEFAULT_LOG_FILTER))
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();
        let app = create_app(AppState::new(db));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), 200);

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("finished processing request"), "log was: {log:?}");
    }
}
