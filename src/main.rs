use chrono::Utc;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info, warn};

use polls_api::{
    app::{create_router, AppState},
    config::{Config, StorageBackend},
    middleware::init_tracing,
    repository::{seed_sample_polls, Database, InMemoryRepository, PollRepository},
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully ({:?} environment)", config.environment);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let repo = match build_repository(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    if config.polls.seed_sample_data {
        if let Err(e) = seed_sample_polls(repo.as_ref(), Utc::now()).await {
            error!("Failed to seed sample polls: {}", e);
            std::process::exit(1);
        }
    }

    let app = create_router(
        AppState::new(repo, config.polls.clone()),
        config.request_timeout,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Connects the configured storage backend and prepares its schema
async fn build_repository(config: &Config) -> Result<Arc<dyn PollRepository>, polls_api::ApiError> {
    match (config.storage, config.database.clone()) {
        (StorageBackend::Postgres, Some(database_config)) => {
            let database = Database::new(database_config).await?;
            info!("Database connection established");

            database.migrate().await?;
            Ok(Arc::new(database))
        }
        (StorageBackend::Postgres, None) => Err(polls_api::ApiError::Internal(anyhow::anyhow!(
            "PostgreSQL storage selected without database configuration"
        ))),
        (StorageBackend::Memory, _) => {
            if config.environment.is_production() {
                warn!("Using in-memory storage in production; data is lost on restart");
            } else {
                info!("Using in-memory storage");
            }
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }
}

/// Graceful shutdown signal handler
/// Listens for SIGTERM and SIGINT signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
