/// Project entity definition
///
/// The only persisted entity. It exists so the schema bootstrap has a real
/// table to create; no HTTP route reads or writes projects yet.

use serde::{Deserialize, Serialize};
use sqlx::{any::AnyRow, FromRow, Row};

/// Maximum length of `name` and `description` columns
pub const MAX_FIELD_LEN: usize = 255;

/// A project record as stored in the `projects` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Auto-assigned primary key
    pub id: i64,
    /// Unique project name
    pub name: String,
    pub description: Option<String>,
}

impl<'r> FromRow<'r, AnyRow> for Project {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }
}
