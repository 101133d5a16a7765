use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use api::{AppState, build_router, config::ServerConfig};
use infrastructure::{ClockIdGenerator, JsonFileStoreRepository};

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = ServerConfig::from_env();

    // --- Dependency Injection ---
    let repository = match JsonFileStoreRepository::open(config.data_file.clone()).await {
        Ok(repository) => {
            info!(path = %repository.path().display(), "JSON file store ready.");
            Arc::new(repository)
        }
        Err(e) => {
            error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };
    let ids = Arc::new(ClockIdGenerator::new());
    let app_state = AppState::new(repository, ids);
    info!("Application services initialized.");

    let app = build_router(app_state);
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server running on http://localhost:{}", config.port);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
