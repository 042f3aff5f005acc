//! lp-stats - liquidity-pool analytics API
//!
//! Read-only HTTP endpoints over pool, token and windowed aggregate data
//! kept in PostgreSQL by an external ingestion pipeline. Provides filtered
//! and paginated listings, windowed fee/volume rankings, per-pool bucket
//! series, CSV exports, and a sync status probe.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware::from_fn, routing::get, Router};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod agg_routes;
mod app_error;
mod app_state;
mod cache;
mod database;
mod export_routes;
mod filters;
mod middleware;
mod models;
mod pagination;
mod routes;
mod window;

use app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lp_stats=debug"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();

    tracing::info!("Starting lp-stats server...");

    // ========== Database Connection ==========

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let postgres = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await?;
    tracing::info!("Connected to PostgreSQL");

    // ========== Application State ==========

    let graph_endpoint = env::var("GRAPH_ENDPOINT").ok();
    if graph_endpoint.is_none() {
        tracing::warn!("GRAPH_ENDPOINT not set, sync status will skip the indexer probe");
    }
    let state = Arc::new(AppState::new(postgres, graph_endpoint));

    // ========== Axum Router ==========

    let app = Router::new()
        // Health check
        .route("/health", get(routes::health))
        // Listings and summary
        .route("/tokens", get(routes::list_tokens))
        .route("/pools", get(routes::list_pools))
        .route("/metrics/summary", get(routes::metrics_summary))
        // Windowed rankings and per-pool series
        .route("/pools/top_fees", get(agg_routes::top_fees))
        .route("/pools/top_volume", get(agg_routes::top_volume))
        .route("/pools/{pool_id}/agg", get(agg_routes::pool_agg))
        // CSV exports
        .route("/export/top_fees.csv", get(export_routes::export_top_fees))
        .route("/export/top_volume.csv", get(export_routes::export_top_volume))
        .route("/export/pool_agg.csv", get(export_routes::export_pool_agg))
        // Ingestion/indexer visibility
        .route("/sync/status", get(routes::sync_status))
        // Request logging
        .layer(from_fn(middleware::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // ========== Start Server ==========

    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse()
        .unwrap_or(8000);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
