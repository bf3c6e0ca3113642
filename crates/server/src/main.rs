use std::future::IntoFuture;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use depot_server::api::{AppState, router};
use depot_server::config::DepotConfig;
use depot_server::resolve::Resolver;

use depot_cache_redis::RedisCache;
use depot_catalog_postgres::PostgresCatalog;

/// Depot file service HTTP server.
#[derive(Parser, Debug)]
#[command(name = "depot-server", about = "Standalone HTTP server for the depot file service")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "depot.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run catalog migrations, then exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let mut config: DepotConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Some(Commands::Migrate) = cli.command {
        return run_migrate(&config).await;
    }

    // The three working directories must exist before the first request.
    tokio::fs::create_dir_all(&config.storage.uploads_dir).await?;
    tokio::fs::create_dir_all(&config.storage.archive_dir).await?;
    tokio::fs::create_dir_all(&config.storage.scratch_dir).await?;
    sweep_scratch(&config.storage.scratch_dir).await;

    let catalog = Arc::new(PostgresCatalog::new(config.catalog.to_postgres_config()).await?);
    info!(url = %config.catalog.url, "catalog connected");

    let cache = Arc::new(RedisCache::new(&config.cache.to_redis_config())?);
    info!(url = %config.cache.url, "cache configured");

    let config = Arc::new(config);
    let resolver = Arc::new(Resolver::new(
        catalog.clone(),
        cache.clone(),
        config.cache.ttl(),
    ));

    let state = AppState {
        resolver,
        catalog,
        cache,
        config: config.clone(),
    };
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "depot-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM. After the signal,
    // in-flight requests get a bounded drain window.
    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        shutdown_signal().await;
        let _ = signal_tx.send(());
    };

    let drain_limit = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        () = async {
            let _ = signal_rx.await;
            tokio::time::sleep(drain_limit).await;
        } => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, aborting in-flight requests"
            );
        }
    }

    info!("depot-server stopped");
    Ok(())
}

async fn run_migrate(config: &DepotConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(url = %config.catalog.url, "running catalog migrations");
    PostgresCatalog::new(config.catalog.to_postgres_config()).await?;
    info!("migrations complete");
    Ok(())
}

/// Remove archives that a crash left behind in the scratch directory.
///
/// Scratch files are normally unlinked as soon as they are opened for
/// streaming, so anything still present at startup is an orphan.
async fn sweep_scratch(dir: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "zip") {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to remove orphaned scratch archive");
            } else {
                info!(path = %path.display(), "removed orphaned scratch archive");
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
