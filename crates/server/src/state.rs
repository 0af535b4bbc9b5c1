use std::path::Path;
use std::sync::Arc;
use trackfetch_core::{Config, DirectDownloads, Orchestrator, SanitizedConfig, TrackStore};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn TrackStore>,
    orchestrator: Orchestrator,
    direct_downloads: DirectDownloads,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn TrackStore>,
        orchestrator: Orchestrator,
        direct_downloads: DirectDownloads,
    ) -> Self {
        Self {
            config,
            store,
            orchestrator,
            direct_downloads,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.config.storage.downloads_dir
    }

    pub fn store(&self) -> &dyn TrackStore {
        self.store.as_ref()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn direct_downloads(&self) -> &DirectDownloads {
        &self.direct_downloads
    }
}
