use std::sync::Arc;

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use waypoint::backend::{AuthService, MemoryBackend, RecordStore, SupabaseBackend};
use waypoint::config::{AppConfig, BackendConfig};
use waypoint::server::{AppState, app};
use waypoint::store::{LibSqlBackend, SettingsStore};

/// Stderr always; a daily rolling file too when `log_dir` is set.
fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "waypoint.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = init_tracing(&config);

    eprintln!("🧭 WayPoint v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Notices WS: ws://0.0.0.0:{}/ws/notices", config.port);

    // ── Backend ──────────────────────────────────────────────────────────
    let (auth, records): (Arc<dyn AuthService>, Arc<dyn RecordStore>) = match &config.backend {
        BackendConfig::Memory => {
            warn!("Using in-memory backend with demo accounts");
            let backend = Arc::new(MemoryBackend::with_demo_accounts());
            let auth: Arc<dyn AuthService> = backend.clone();
            let records: Arc<dyn RecordStore> = backend;
            (auth, records)
        }
        BackendConfig::Supabase { url, anon_key } => {
            info!(url = %url, "Using Supabase backend");
            let backend = Arc::new(SupabaseBackend::new(url.clone(), anon_key.clone()));
            let auth: Arc<dyn AuthService> = backend.clone();
            let records: Arc<dyn RecordStore> = backend;
            (auth, records)
        }
    };

    // ── Local settings ───────────────────────────────────────────────────
    let settings: Arc<dyn SettingsStore> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
    info!(path = %config.db_path.display(), "Settings database ready");

    // ── Session ──────────────────────────────────────────────────────────
    let state = AppState::new(auth, records, settings);
    let _listener = state.mirror.spawn_listener();
    let _quiz_guard = state.spawn_quiz_guard();
    match state.mirror.restore().await {
        Ok(session) => info!(user = ?session.user().map(|u| &u.email), "Session restored"),
        Err(e) => warn!(error = %e, "Session restore failed, starting signed out"),
    }

    // ── Server ───────────────────────────────────────────────────────────
    let router = app(state, &config.allowed_origins);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "WayPoint server listening");
    axum::serve(listener, router).await?;

    Ok(())
}
