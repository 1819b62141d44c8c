//! libSQL-backed `SettingsStore`. Supports local file and in-memory databases.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use tracing::info;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::SettingsStore;

/// Single reused connection; `libsql::Connection` is safe for concurrent async use.
pub struct LibSqlBackend {
    // Held so the database outlives the connection.
    _db: Database,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self { _db: db, conn };
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// In-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self { _db: db, conn };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }
}

#[async_trait]
impl SettingsStore for LibSqlBackend {
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;
                let value = serde_json::from_str(&raw)
                    .map_err(|e| DatabaseError::Serialization(format!("setting {key}: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let raw = serde_json::to_string(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![user_id, key, raw, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_setting: {e}")))?;
        Ok(())
    }

    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute(
                "DELETE FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_setting: {e}")))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settings_crud() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        let value = serde_json::json!({"id": "3", "role": "student"});

        db.set_setting("default", "waypoint_user", &value).await.unwrap();
        let fetched = db
            .get_setting("default", "waypoint_user")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched["role"], "student");

        db.set_setting("default", "waypoint_user", &serde_json::json!({"id": "1"}))
            .await
            .unwrap();
        let fetched = db
            .get_setting("default", "waypoint_user")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched["id"], "1");

        assert!(db.delete_setting("default", "waypoint_user").await.unwrap());
        assert!(db.get_setting("default", "waypoint_user").await.unwrap().is_none());
        assert!(!db.delete_setting("default", "waypoint_user").await.unwrap());
    }

    #[tokio::test]
    async fn settings_user_isolation() {
        let db = LibSqlBackend::new_memory().await.unwrap();
        db.set_setting("a", "k", &serde_json::json!("one")).await.unwrap();
        db.set_setting("b", "k", &serde_json::json!("two")).await.unwrap();
        assert_eq!(db.get_setting("a", "k").await.unwrap().unwrap(), "one");
        assert_eq!(db.get_setting("b", "k").await.unwrap().unwrap(), "two");
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("waypoint.db");

        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.set_setting("default", "k", &serde_json::json!({"x": 1}))
                .await
                .unwrap();
        }

        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let value = db.get_setting("default", "k").await.unwrap().unwrap();
        assert_eq!(value["x"], 1);
    }
}
