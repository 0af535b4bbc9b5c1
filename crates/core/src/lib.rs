pub mod config;
pub mod download;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod process;
pub mod resolver;
pub mod searcher;
pub mod testing;
pub mod track;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use download::{
    DirectDownloadError, DirectDownloadResult, DirectDownloads, DownloadError, DownloadExecutor,
    ExecutorSettings,
};
pub use media::{MediaConfig, MediaTool, YtDlp};
pub use orchestrator::{
    create_log_file_system, Job, JobHandler, JobSpec, JobStats, JobStatus, LogEntry, LogHub,
    Orchestrator, OrchestratorConfig, OrchestratorError,
};
pub use process::{ProcessError, ProcessRunner};
pub use resolver::{build_resolver, AiConfig, ResolutionResult, Resolver};
pub use searcher::{Searcher, YoutubeConfig, YoutubeSearcher};
pub use track::{DownloadStatus, SqliteTrackStore, Track, TrackSource, TrackStore};
