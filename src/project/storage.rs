/// Storage access for project records
///
/// Thin query layer over the `projects` table. Uniqueness of names is left to
/// the database constraint; a violation surfaces as [`DatabaseError::DuplicateName`].

use crate::project::{
    database::{Database, DatabaseError},
    types::{Project, MAX_FIELD_LEN},
};

#[derive(Debug, Clone)]
pub struct ProjectStorage {
    db: Database,
}

impl ProjectStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a project and return the stored row
    pub async fn insert(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, DatabaseError> {
        check_len("name", name)?;
        if let Some(description) = description {
            check_len("description", description)?;
        }

        let mut session = self.db.acquire_session().await?;

        sqlx::query("INSERT INTO projects (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(session.connection())
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return DatabaseError::DuplicateName(name.to_string());
                    }
                }
                DatabaseError::Query(e)
            })?;

        let project: Project =
            sqlx::query_as("SELECT id, name, description FROM projects WHERE name = ?")
                .bind(name)
                .fetch_one(session.connection())
                .await?;

        session.commit().await?;

        tracing::info!(id = project.id, name = %project.name, "Stored project");
        Ok(project)
    }

    /// Look a project up by its unique name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Project>, DatabaseError> {
        let project = sqlx::query_as("SELECT id, name, description FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(project)
    }
}

fn check_len(field: &'static str, value: &str) -> Result<(), DatabaseError> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(DatabaseError::FieldTooLong { field, max: MAX_FIELD_LEN });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::schema::ensure_schema;

    async fn storage() -> ProjectStorage {
        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();
        ensure_schema(&db).await.unwrap();
        ProjectStorage::new(db)
    }

    #[tokio::test]
    async fn insert_then_lookup_by_name() {
        let storage = storage().await;

        let stored = storage.insert("apollo", Some("moon landing")).await.unwrap();
        assert_eq!(stored.name, "apollo");
        assert_eq!(stored.description.as_deref(), Some("moon landing"));

        let found = storage.get_by_name("apollo").await.unwrap();
        assert_eq!(found, Some(stored));
        assert_eq!(storage.get_by_name("gemini").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_by_the_schema() {
        let storage = storage().await;

        let first = storage.insert("apollo", None).await.unwrap();
        let err = storage.insert("apollo", Some("again")).await.unwrap_err();

        assert!(matches!(err, DatabaseError::DuplicateName(ref n) if n == "apollo"));
        // First row is intact and no second row slipped in
        assert_eq!(storage.get_by_name("apollo").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn raw_duplicate_insert_is_a_unique_violation() {
        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();
        ensure_schema(&db).await.unwrap();

        sqlx::query("INSERT INTO projects (name) VALUES ('apollo')")
            .execute(db.pool())
            .await
            .unwrap();
        let err = sqlx::query("INSERT INTO projects (name) VALUES ('apollo')")
            .execute(db.pool())
            .await
            .unwrap_err();

        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn overlong_name_is_refused_before_hitting_the_database() {
        let storage = storage().await;
        let name = "x".repeat(MAX_FIELD_LEN + 1);

        let err = storage.insert(&name, None).await.unwrap_err();
        assert!(matches!(err, DatabaseError::FieldTooLong { field: "name", .. }));
    }
}
