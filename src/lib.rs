pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod security;
pub mod services;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

/// Writes a default config file. Runs before any config is loaded.
pub fn init_config(path: Option<&Path>) -> anyhow::Result<()> {
    let shown = path.map_or_else(|| "config.toml".into(), |p| p.display().to_string());

    if Config::create_default_if_missing(path)? {
        println!("Wrote default config to {shown}");
    } else {
        println!("{shown} already exists, left untouched");
    }
    Ok(())
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if cli.command() == Commands::Init {
        return init_config(cli.config.as_deref());
    }

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config)?;
    config.validate()?;

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    match cli.command() {
        Commands::Check => {
            db::wait_until_ready(&config.general.database_url, &config.startup).await?;
            println!("Database is ready");
            Ok(())
        }
        Commands::Serve | Commands::Init => run_server(config, prometheus_handle).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.general.log_format.eq_ignore_ascii_case("json");

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer));

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "stockroom")?
            .extra_field("env", config.general.environment.as_str())?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Stockroom v{} starting ({} environment)",
        env!("CARGO_PKG_VERSION"),
        config.general.environment.as_str()
    );

    db::wait_until_ready(&config.general.database_url, &config.startup).await?;

    let shared = Arc::new(SharedState::new(config).await?);
    shared
        .store
        .init_superuser(&shared.config.bootstrap)
        .await
        .context("Failed to bootstrap first superuser")?;

    let port = shared.config.server.port;
    let app = api::router(api::create_app_state(shared.clone(), prometheus_handle));

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    shared.store.clone().close().await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
