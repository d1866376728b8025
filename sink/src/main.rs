use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telemetry_sink::{config::Config, db::Database, handlers, state::AppState};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(2).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received shutdown signal, draining in-flight batches"),
        Err(err) => tracing::error!(error = %err, "Failed to listen for shutdown signal"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telemetry_sink=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_host = %config.database.host,
        database_port = config.database.port,
        database_name = %config.database.database,
        database_username = %config.database.username,
        database_password = %mask_secret(&config.database.password),
        driver = %config.database.driver,
        max_connections = config.database.max_connections,
        bind_addr = %config.bind_addr,
        "Loaded configuration from environment/.env"
    );

    // One database handle for the whole process, shared by every batch
    let database = Database::connect(&config.database)?;
    let app = handlers::router(AppState::from_database(database));

    tracing::info!("Queue consumer listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
