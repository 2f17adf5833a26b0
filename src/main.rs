use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use review_seeder::{
    config::{Config, StorageBackend},
    db::{DocumentStore, FirestoreStore, MemoryStore},
    handlers,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_seeder=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Review Seeder...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded (storage: {})", config.storage.name());

    let store: Arc<dyn DocumentStore> = match &config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; seeded data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Firestore(firestore) => {
            tracing::info!(
                "Using Firestore project {} database {}",
                firestore.project_id,
                firestore.database_id
            );
            Arc::new(FirestoreStore::new(firestore)?)
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;

    // Initialize application state
    let state = AppState::new(store, config);

    // Build application routes
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::api_routes())

        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
