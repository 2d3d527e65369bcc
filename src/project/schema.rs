/// Schema bootstrap for the project database
///
/// Creates every known table if it is missing. Existing tables and their rows
/// are never touched, so running it again after success changes nothing.

use crate::project::database::{Backend, Database, DatabaseError};

const MYSQL_PROJECTS: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER NOT NULL AUTO_INCREMENT,
        name VARCHAR(255) NOT NULL,
        description VARCHAR(255),
        PRIMARY KEY (id),
        UNIQUE KEY ix_projects_name (name)
    )
"#;

const SQLITE_PROJECTS: &str = r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(255) NOT NULL UNIQUE,
        description VARCHAR(255)
    )
"#;

/// DDL for all known tables in the given dialect
fn table_definitions(backend: Backend) -> &'static [&'static str] {
    match backend {
        Backend::MySql => &[MYSQL_PROJECTS],
        Backend::Sqlite => &[SQLITE_PROJECTS],
    }
}

/// Ensure all tables exist
///
/// Fails with [`DatabaseError::SchemaCreation`] when the database cannot be
/// reached or refuses the DDL.
pub async fn ensure_schema(db: &Database) -> Result<(), DatabaseError> {
    tracing::debug!("Ensuring database schema");

    for &ddl in table_definitions(db.backend()) {
        sqlx::query(ddl)
            .execute(db.pool())
            .await
            .map_err(DatabaseError::SchemaCreation)?;
    }

    tracing::debug!("Database schema is in place");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_sql(db: &Database) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn creates_projects_table() {
        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();
        ensure_schema(&db).await.unwrap();

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(names, vec!["projects".to_string()]);
    }

    #[tokio::test]
    async fn second_run_leaves_schema_and_rows_untouched() {
        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();

        ensure_schema(&db).await.unwrap();
        let first = table_sql(&db).await;

        sqlx::query("INSERT INTO projects (name, description) VALUES ('alpha', 'kept')")
            .execute(db.pool())
            .await
            .unwrap();

        ensure_schema(&db).await.unwrap();
        let second = table_sql(&db).await;

        assert_eq!(first, second);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn unusable_pool_is_a_schema_creation_error() {
        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();
        db.close().await;

        let err = ensure_schema(&db).await.unwrap_err();
        assert!(matches!(err, DatabaseError::SchemaCreation(_)));
    }
}
