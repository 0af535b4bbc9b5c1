use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackfetch_core::{
    build_resolver, create_log_file_system, load_config, validate_config, DirectDownloads,
    DownloadExecutor, ExecutorSettings, JobHandler, LogHub, MediaTool, Orchestrator, Searcher,
    SqliteTrackStore, TrackStore, YoutubeSearcher, YtDlp,
};

use trackfetch_server::api::create_router;
use trackfetch_server::state::AppState;

/// How long shutdown waits for the job log writer to flush.
const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TRACKFETCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.storage.db_path);
    info!("Downloads directory: {:?}", config.storage.downloads_dir);

    // Track store
    let store: Arc<dyn TrackStore> = Arc::new(
        SqliteTrackStore::new(&config.storage.db_path).context("Failed to open track store")?,
    );
    info!("Track store initialized");

    // Search provider and resolver
    let searcher: Arc<dyn Searcher> = Arc::new(YoutubeSearcher::new(config.youtube.clone()));
    let resolver = build_resolver(&config.ai, Arc::clone(&searcher))
        .context("Failed to create video resolver")?;
    info!("Using {} resolver", resolver.name());

    // Media tool
    let media: Arc<dyn MediaTool> = Arc::new(YtDlp::new(config.media.clone()));
    info!("Using media tool at {:?}", config.media.ytdlp_path);

    // Job log: durable file sink fed by a background writer
    let (log_sink, log_writer) = create_log_file_system(config.download.log_file.clone());
    let writer_handle = tokio::spawn(log_writer.run());
    let logs = Arc::new(LogHub::new(
        Arc::new(log_sink),
        config.download.max_recent_logs,
    ));

    // Executor and orchestrator
    let executor: Arc<dyn JobHandler> = Arc::new(DownloadExecutor::new(
        Arc::clone(&store),
        resolver,
        Arc::clone(&media),
        ExecutorSettings {
            downloads_dir: config.storage.downloads_dir.clone(),
            audio_format: config.media.audio_format.clone(),
        },
    ));
    let orchestrator = Orchestrator::new(&config.download, executor, logs);
    info!(
        max_concurrent_jobs = orchestrator.max_concurrent_jobs(),
        "Download orchestrator ready"
    );

    let direct_downloads = DirectDownloads::new(
        Arc::clone(&store),
        media,
        orchestrator.clone(),
        config.youtube.direct_download_max_items,
    );

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        orchestrator.clone(),
        direct_downloads,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    let stats = orchestrator.stats();
    if stats.active_jobs > 0 || stats.queue_length > 0 {
        warn!(
            active = stats.active_jobs,
            queued = stats.queue_length,
            "Unfinished download jobs will be abandoned"
        );
    }

    // The writer exits once every log sink handle is dropped. Running jobs
    // still hold one, so the wait is bounded.
    drop(orchestrator);
    match tokio::time::timeout(LOG_FLUSH_TIMEOUT, writer_handle).await {
        Ok(_) => info!("Job log writer stopped"),
        Err(_) => warn!("Timed out waiting for job log writer"),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
