use axum::Router;
use confluence::{api, config::Config, AppState};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confluence=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Starting Confluence server on {}:{}", config.host, config.port);
    info!(
        "Indicator cache capacity {}, broadcast capacity {}",
        config.engine.cache_capacity, config.engine.broadcast_capacity
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config);

    // Log harmonized results as they are published
    let mut updates = state.engine.subscribe();
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(result) => info!(
                    "Published {} signals: {} ({:.2})",
                    result.symbol,
                    result.dominant.direction.label(),
                    result.dominant.dominance
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Signal log subscriber lagged by {} results", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Confluence server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
