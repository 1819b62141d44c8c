//! Configuration types.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Which hosted backend the server talks to.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// In-process backend seeded with demo accounts.
    Memory,
    /// Hosted Supabase project (GoTrue auth + PostgREST).
    Supabase {
        url: String,
        anon_key: SecretString,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for the REST + WebSocket server.
    pub port: u16,
    /// Path to the local libSQL file holding persisted session state.
    pub db_path: PathBuf,
    pub backend: BackendConfig,
    /// Directory for rolling log files. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from("./data/waypoint.db"),
            backend: BackendConfig::Memory,
            log_dir: None,
            allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from `WAYPOINT_*` and `SUPABASE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("WAYPOINT_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "WAYPOINT_PORT".into(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            None => defaults.port,
        };

        let db_path = lookup("WAYPOINT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let url = lookup("SUPABASE_URL").filter(|s| !s.trim().is_empty());
        let backend_kind = lookup("WAYPOINT_BACKEND").unwrap_or_else(|| {
            if url.is_some() {
                "supabase".to_string()
            } else {
                "memory".to_string()
            }
        });

        let backend = match backend_kind.as_str() {
            "memory" => BackendConfig::Memory,
            "supabase" => {
                let url = url.ok_or_else(|| ConfigError::MissingRequired {
                    key: "SUPABASE_URL".into(),
                    hint: "Set it to your project URL, e.g. https://xyz.supabase.co".into(),
                })?;
                let anon_key = lookup("SUPABASE_ANON_KEY")
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| ConfigError::MissingRequired {
                        key: "SUPABASE_ANON_KEY".into(),
                        hint: "Copy the anon public key from the project API settings".into(),
                    })?;
                BackendConfig::Supabase {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key: SecretString::from(anon_key),
                }
            }
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "WAYPOINT_BACKEND".into(),
                    message: format!("expected 'memory' or 'supabase', got '{other}'"),
                });
            }
        };

        let allowed_origins = lookup("WAYPOINT_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            db_path,
            backend,
            log_dir: lookup("WAYPOINT_LOG_DIR").map(PathBuf::from),
            allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, PathBuf::from("./data/waypoint.db"));
        assert!(matches!(config.backend, BackendConfig::Memory));
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn supabase_url_selects_supabase_backend() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon-key"),
        ]))
        .unwrap();
        match config.backend {
            BackendConfig::Supabase { url, anon_key } => {
                assert_eq!(url, "https://demo.supabase.co");
                assert_eq!(anon_key.expose_secret(), "anon-key");
            }
            other => panic!("expected supabase backend, got {other:?}"),
        }
    }

    #[test]
    fn supabase_without_key_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("WAYPOINT_BACKEND", "supabase"),
            ("SUPABASE_URL", "https://demo.supabase.co"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "SUPABASE_ANON_KEY"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("WAYPOINT_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn allowed_origins_are_split_and_trimmed() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "WAYPOINT_ALLOWED_ORIGINS",
            "http://localhost:5173, https://waypoint.example ,",
        )]))
        .unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5173", "https://waypoint.example"]
        );
    }
}
