mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelkeeper_core::{
    config::{LoggingConfig, TorrentClientBackend},
    load_config, validate_config, Config, FsPlacer, JobOrchestrator, LibraryStore, Organizer,
    QBittorrentClient, SqliteLibraryStore, TorrentClient,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(logging.json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!logging.json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Builds the configured torrent client, if any.
fn create_torrent_client(config: &Config) -> Result<Option<Arc<dyn TorrentClient>>> {
    let Some(tc_config) = &config.torrent_client else {
        info!("No torrent client configured");
        return Ok(None);
    };

    match tc_config.backend {
        TorrentClientBackend::QBittorrent => {
            let qbit_config = tc_config
                .qbittorrent
                .as_ref()
                .context("qBittorrent backend selected but no qbittorrent config provided")?;
            info!("Initializing qBittorrent client at {}", qbit_config.url);
            let client = QBittorrentClient::new(qbit_config.clone())
                .context("Failed to create qBittorrent client")?;
            Ok(Some(Arc::new(client)))
        }
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("REELKEEPER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Initialize logging
    init_tracing(&config.logging);
    info!("Configuration loaded from {:?}", config_path);

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Library base path: {:?}", config.library.base_path);
    info!("Database path: {:?}", config.database.path);

    // Create SQLite library store
    let store: Arc<dyn LibraryStore> = Arc::new(
        SqliteLibraryStore::new(&config.database.path)
            .context("Failed to create library store")?,
    );
    info!("Library store initialized");

    // Job queues need a torrent client to organize anything
    let jobs = match create_torrent_client(&config)? {
        Some(torrent_client) => {
            let organizer = Arc::new(Organizer::new(
                Arc::clone(&store),
                Arc::clone(&torrent_client),
                Arc::new(FsPlacer::new()),
                config.library.clone(),
            ));
            let orchestrator = JobOrchestrator::new(
                config.jobs.clone(),
                Arc::clone(&store),
                torrent_client,
                organizer,
            );
            orchestrator
                .start()
                .await
                .context("Failed to start job orchestrator")?;
            info!("Job orchestrator started");
            Some(Arc::new(orchestrator))
        }
        None => {
            warn!("Job queues disabled: no torrent client configured");
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), jobs.clone()));

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

    // Stop job queues if running
    if let Some(ref jobs) = jobs {
        info!("Stopping job orchestrator...");
        jobs.stop().await;
    }

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
