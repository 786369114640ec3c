use anyhow::{Context, Result};
use clap::Parser;
use occur_core::store::InMemoryEventStore;
use occur_server::{cli::Cli, config::Config, router, state::AppState};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli).context("failed to load configuration")?;

    init_tracing(&config.log_level);
    tracing::info!(config = ?config, "Configuration loaded");

    let service = config.calendar.service()?;
    let store = InMemoryEventStore::load(&config.events_path)
        .await
        .with_context(|| format!("failed to load events from {}", config.events_path.display()))?;

    let app = router(AppState::new(store, service, config.limits));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!("occur-server listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("occur-server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let (filter, invalid_level) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, false),
        Err(_) => match EnvFilter::try_new(level) {
            Ok(filter) => (filter, false),
            Err(_) => (EnvFilter::new("info"), true),
        },
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    if invalid_level {
        tracing::warn!(level = %level, "Invalid log level in config, using info");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
