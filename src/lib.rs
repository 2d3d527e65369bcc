/// Project Management API: backend scaffold for a project management tool
///
/// Waits for the relational database to become reachable, bootstraps the
/// `projects` table, and serves liveness and database health endpoints.

// Core configuration and setup
pub mod config;

// Connection pool, scoped sessions, schema bootstrap and project storage
pub mod project;

// Bounded retry state machine run once before serving
pub mod startup;

// HTTP API layer - liveness and health check endpoints
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use api::AppState;
pub use project::{ensure_schema, Database, DatabaseError, Project, ProjectStorage};
pub use server::{create_app, start_server};
pub use startup::{RetryPolicy, StartupSequencer, StartupState};
