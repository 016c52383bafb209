mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vestibule_core::{
    load_config, validate_config, ChangeNotifier, DepartmentSeed, DepartmentStore, QueueEngine,
    SqliteDepartmentStore, SqliteTicketStore, TicketStore,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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
    let config_path = std::env::var("VESTIBULE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Create SQLite department store
    let departments: Arc<dyn DepartmentStore> = Arc::new(
        SqliteDepartmentStore::new(&config.database.path)
            .context("Failed to create department store")?,
    );
    info!("Department store initialized");

    // Create SQLite ticket store
    let tickets: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path).context("Failed to create ticket store")?,
    );
    info!("Ticket store initialized");

    // Ensure configured departments exist
    seed_departments(departments.as_ref(), &config.departments)?;

    // Create change notifier and queue engine
    let notifier = ChangeNotifier::new(config.queue.notify_buffer);
    let engine = Arc::new(QueueEngine::new(
        Arc::clone(&departments),
        Arc::clone(&tickets),
        notifier.clone(),
        config.queue.service_minutes_per_ticket,
    ));
    info!("Queue engine initialized");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        engine,
        departments,
        notifier,
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

    Ok(())
}

/// Get-or-create each configured department by its name + facility pair.
fn seed_departments(
    store: &dyn DepartmentStore,
    seeds: &[DepartmentSeed],
) -> Result<()> {
    for seed in seeds {
        match store
            .find_by_name(&seed.name, &seed.facility)
            .context("Failed to look up seed department")?
        {
            Some(existing) => {
                info!(
                    id = %existing.id,
                    name = %existing.name,
                    facility = %existing.facility,
                    "department already present"
                );
            }
            None => {
                let department = store
                    .create(&seed.name, &seed.facility)
                    .context("Failed to create seed department")?;
                info!(
                    id = %department.id,
                    name = %department.name,
                    facility = %department.facility,
                    "department seeded"
                );
            }
        }
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
