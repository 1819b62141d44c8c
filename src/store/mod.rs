//! Local persistence: a libSQL file holding versioned settings.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{DEFAULT_USER, SESSION_USER_KEY, SettingsStore};
