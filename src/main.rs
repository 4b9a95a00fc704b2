//! ILM Server - library management REST API

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ilm_server::{
    api, config::AppConfig, db, repository::Repository, services::google_books::GoogleBooksClient,
    services::Services, validation::RequestValidator, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    init_tracing(&config);

    tracing::info!("Starting ILM Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::connect(&config.database).await?;
    db::migrate(&pool).await?;

    let catalog = GoogleBooksClient::new(&config.google_books)?;
    if config.google_books.api_key.is_empty() {
        tracing::warn!("No Google Books API key configured, searches use the local catalog only");
    }

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), Arc::new(catalog));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let base_path = config.server.base_path.clone();

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        validator: Arc::new(RequestValidator::new()),
    };

    let app = create_router(state, &base_path);

    tracing::info!("Server listening on http://{}{}", addr, base_path);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ilm_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes
fn create_router(state: AppState, base_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest(base_path, api::routes(state))
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
