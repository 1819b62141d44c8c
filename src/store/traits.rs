//! Local key/value persistence for per-user settings.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Settings partition used when there is a single local operator.
pub const DEFAULT_USER: &str = "default";

/// Key holding the serialized session-mirror user.
pub const SESSION_USER_KEY: &str = "waypoint_user";

/// JSON values stored per `(user_id, key)`.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or replace.
    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Returns whether a row was removed.
    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError>;
}
