use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use veggiescan_storage::VeggieStore;

use veggiescan_server::app;
use veggiescan_server::auth::ensure_default_admin;
use veggiescan_server::config::ServerConfig;
use veggiescan_server::state::{build_analyzer, AppState};

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  veggiescan-server [config.toml]                 Start the server");
    eprintln!("  veggiescan-server clear-scans <config.toml>     Delete every scan record");
    eprintln!("  veggiescan-server --help                        Show this message");
}

#[tokio::main]
async fn main() -> Result<()> {
    veggiescan_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("veggiescan=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("clear-scans") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("clear-scans requires <config.toml> argument")
            })?;
            run_clear_scans(config_path).await
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/server.toml");
            run_server(config_path).await
        }
    }
}

async fn open_store(config: &ServerConfig) -> Result<VeggieStore> {
    let db_url = config.database.connection_url();
    VeggieStore::new(&db_url, Path::new(&config.database.data_dir)).await
}

/// Bulk delete of the scan history. Users are kept.
async fn run_clear_scans(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    let store = open_store(&config).await?;
    let deleted = store.clear_scan_records().await?;
    tracing::info!(deleted, "Scan records cleared");
    Ok(())
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;
    tracing::info!(path = %config_path, "Loaded configuration");

    let store = Arc::new(open_store(&config).await?);

    let jwt_secret = match &config.auth.jwt_secret {
        Some(secret) if !secret.is_empty() => secret.clone(),
        _ => {
            tracing::warn!("No jwt_secret configured. A random secret was generated and will change on restart. Set [auth].jwt_secret in config for production use.");
            veggiescan_storage::auth::generate_secret()
        }
    };

    if let Err(e) = ensure_default_admin(&store, &config.auth).await {
        tracing::error!(error = %e, "Failed to create default admin account");
    }

    let analyzer = build_analyzer(&config.ai)?;
    match &analyzer {
        Some(a) => tracing::info!(
            provider = %a.provider(),
            model = %a.model_name(),
            base_url = %config.ai.base_url,
            "Vision model configured"
        ),
        None => tracing::info!("AI mock mode enabled, scans use the fallback generator"),
    }

    let http_addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let state = AppState::new(config, store, analyzer, jwt_secret);
    tracing::info!(chain = ?state.pipeline.strategy_names(), "Scan pipeline ready");
    let app = app::build_http_app(state);

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    tracing::info!(http = %http_addr, "Server started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        signal::ctrl_c().await.ok();
        tracing::info!("Shutting down gracefully");
    })
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
