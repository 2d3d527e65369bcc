/// Project persistence module
///
/// Owns the connection pool, the scoped session factory, the `projects` table
/// definition and the schema bootstrap.

pub mod database;
pub mod schema;
pub mod storage;
pub mod types;

pub use database::{Backend, Database, DatabaseError, Session};
pub use schema::ensure_schema;
pub use storage::ProjectStorage;
pub use types::Project;
