use case_intake::error::AppError;
use case_intake::intake::{CatalogConfig, InMemorySessionStore, PatternCatalog, StoreError};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the catalog from `path` when given, otherwise the built-in catalog.
pub(crate) fn load_catalog(path: Option<&Path>) -> Result<PatternCatalog, AppError> {
    let catalog = match path {
        Some(path) => PatternCatalog::load(CatalogConfig::from_path(path)?)?,
        None => PatternCatalog::standard()?,
    };
    info!(
        version = catalog.version(),
        patterns = catalog.patterns().len(),
        source = %path.map_or_else(|| "built-in".to_string(), |path| path.display().to_string()),
        "pattern catalog loaded"
    );
    Ok(catalog)
}

/// Periodically drops sessions idle for longer than `ttl`.
pub(crate) fn spawn_session_reaper(
    store: InMemorySessionStore,
    ttl: chrono::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match sweep_sessions(&store, ttl) {
                Ok((0, _)) => {}
                Ok((purged, remaining)) => info!(purged, remaining, "purged inactive sessions"),
                Err(err) => warn!(error = %err, "session purge failed"),
            }
        }
    })
}

/// Purges idle sessions, returning how many were dropped and how many remain.
fn sweep_sessions(
    store: &InMemorySessionStore,
    ttl: chrono::Duration,
) -> Result<(usize, usize), StoreError> {
    let purged = store.purge_inactive(Utc::now(), ttl)?;
    Ok((purged, store.len()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_builtin_catalog_without_path() {
        let catalog = load_catalog(None).expect("built-in catalog");
        assert_eq!(catalog.fallback().id, "general-inquiry");
    }

    #[test]
    fn loads_catalog_from_json_file() {
        let mut config = CatalogConfig::standard();
        config.version = "file-catalog".to_string();
        let path = std::env::temp_dir().join(format!(
            "case-intake-catalog-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            serde_json::to_vec(&config).expect("serialize catalog"),
        )
        .expect("write catalog");

        let catalog = load_catalog(Some(&path)).expect("catalog loads");
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.version(), "file-catalog");
    }

    #[test]
    fn sweep_keeps_active_sessions() {
        use case_intake::intake::{CaseState, SessionId, SessionStore};

        let store = InMemorySessionStore::default();
        let now = Utc::now();
        let idle = CaseState::new(SessionId::new("idle"), now - chrono::Duration::hours(48));
        store.put(idle).expect("put");
        store
            .put(CaseState::new(SessionId::new("active"), now))
            .expect("put");

        let (purged, remaining) =
            sweep_sessions(&store, chrono::Duration::hours(24)).expect("sweep");
        assert_eq!((purged, remaining), (1, 1));
    }

    #[test]
    fn missing_catalog_file_is_an_error() {
        let err = load_catalog(Some(Path::new("/nonexistent/intake-catalog.json")))
            .expect_err("missing file");
        assert!(matches!(err, AppError::Catalog(_)));
    }
}
