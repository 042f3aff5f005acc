//! HTTP route handlers for the listing and summary endpoints
//!
//! Each paginated handler follows the same shape: validate and normalize
//! parameters, check the endpoint cache by canonical signature, run the
//! count query then the data query, project rows, populate the cache.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::app_error::AppError;
use crate::app_state::AppState;
use crate::cache::signature;
use crate::filters::{OrderDir, PoolFilter, PoolOrder};
use crate::models::{
    DbSyncStatus, FeeTierBreakdown, MetricsSummary, Page, PoolOut, SubgraphStatus, SyncStatus,
    TokenOut, VersionBreakdown,
};
use crate::pagination::Pagination;

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TokensQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// GET /tokens - symbol substring search, paginated
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokensQuery>,
) -> Result<Json<Page<TokenOut>>, AppError> {
    let pg = Pagination::resolve(params.page, params.page_size)?;
    let q = params.q.as_deref();

    let key = signature(
        "tokens",
        &[
            ("q", q.unwrap_or_default().to_string()),
            ("page", pg.page.to_string()),
            ("page_size", pg.page_size.to_string()),
        ],
    );
    if let Some(hit) = state.cache_tokens.get(&key).await {
        return Ok(Json(hit));
    }

    let total = state.db.count_tokens(q).await?;
    let rows = state.db.list_tokens(q, pg.limit(), pg.offset()).await?;
    let items: Vec<TokenOut> = rows.into_iter().map(TokenOut::from).collect();

    let page = Page { page: pg.page, page_size: pg.page_size, total, items };
    state.cache_tokens.set(&key, page.clone()).await;
    Ok(Json(page))
}

// ============================================================================
// Pools
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PoolsQuery {
    pub version: Option<i16>,
    pub token: Option<String>,
    pub token_symbol: Option<String>,
    pub fee_min: Option<i32>,
    pub fee_max: Option<i32>,
    pub order_by: Option<PoolOrder>,
    pub order_dir: Option<OrderDir>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// GET /pools - filterable, orderable pool listing
pub async fn list_pools(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PoolsQuery>,
) -> Result<Json<Page<PoolOut>>, AppError> {
    let filter = PoolFilter::resolve(
        params.version,
        params.token,
        params.token_symbol,
        params.fee_min,
        params.fee_max,
    )?;
    let order_by = params.order_by.unwrap_or_default();
    let order_dir = params.order_dir.unwrap_or_default();
    let pg = Pagination::resolve(params.page, params.page_size)?;

    let mut key_params = filter.signature_params();
    key_params.push(("order_by", order_by.as_str().to_string()));
    key_params.push(("order_dir", order_dir.as_str().to_string()));
    key_params.push(("page", pg.page.to_string()));
    key_params.push(("page_size", pg.page_size.to_string()));
    let key = signature("pools", &key_params);

    if let Some(hit) = state.cache_pools.get(&key).await {
        return Ok(Json(hit));
    }

    let total = state.db.count_pools(&filter).await?;
    let rows = state
        .db
        .list_pools(&filter, order_by, order_dir, pg.limit(), pg.offset())
        .await?;
    let items: Vec<PoolOut> = rows.into_iter().map(PoolOut::from).collect();

    let page = Page { page: pg.page, page_size: pg.page_size, total, items };
    state.cache_pools.set(&key, page.clone()).await;
    Ok(Json(page))
}

// ============================================================================
// Metrics Summary
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub version: Option<i16>,
    pub token: Option<String>,
    pub token_symbol: Option<String>,
    pub fee_min: Option<i32>,
    pub fee_max: Option<i32>,
}

/// GET /metrics/summary - total plus version and fee-tier breakdowns
pub async fn metrics_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsQuery>,
) -> Result<Json<MetricsSummary>, AppError> {
    let filter = PoolFilter::resolve(
        params.version,
        params.token,
        params.token_symbol,
        params.fee_min,
        params.fee_max,
    )?;

    let key = signature("metrics_summary", &filter.signature_params());
    if let Some(hit) = state.cache_metrics.get(&key).await {
        return Ok(Json(hit));
    }

    let total = state.db.count_pools(&filter).await?;
    let by_version = state
        .db
        .pools_by_version(&filter)
        .await?
        .into_iter()
        .map(|r| VersionBreakdown { version: r.version, count: r.cnt })
        .collect();
    let by_fee_tier = state
        .db
        .pools_by_fee_tier(&filter)
        .await?
        .into_iter()
        .map(|r| FeeTierBreakdown { fee_tier_bps: r.fee, count: r.cnt })
        .collect();

    let summary = MetricsSummary {
        total,
        by_version,
        by_fee_tier,
        cache_ttl_seconds: state.cache_metrics.ttl_seconds(),
    };
    state.cache_metrics.set(&key, summary.clone()).await;
    Ok(Json(summary))
}

// ============================================================================
// Sync Status
// ============================================================================

/// GET /sync/status - store row counts plus upstream indexer probe
pub async fn sync_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncStatus>, AppError> {
    let counts = state.db.sync_counts().await?;

    let subgraph = match &state.graph_endpoint {
        Some(endpoint) => probe_subgraph(&state, endpoint).await,
        None => SubgraphStatus { endpoint: None, block_number: None, has_indexing_errors: None },
    };

    Ok(Json(SyncStatus { db: DbSyncStatus::from(counts), subgraph }))
}

/// Queries the indexer's `_meta` block. Failures degrade to null fields.
async fn probe_subgraph(state: &AppState, endpoint: &str) -> SubgraphStatus {
    let mut block_number = None;
    let mut has_indexing_errors = None;

    let body = serde_json::json!({
        "query": "{ _meta { block { number } hasIndexingErrors } }"
    });
    match state.http.post(endpoint).json(&body).send().await {
        Ok(resp) => match resp.json::<serde_json::Value>().await {
            Ok(v) => {
                let meta = v.get("data").and_then(|d| d.get("_meta"));
                block_number = meta
                    .and_then(|m| m.get("block"))
                    .and_then(|b| b.get("number"))
                    .and_then(|n| n.as_i64());
                has_indexing_errors = meta
                    .and_then(|m| m.get("hasIndexingErrors"))
                    .and_then(|e| e.as_bool());
            }
            Err(e) => tracing::warn!("subgraph probe returned bad JSON: {e}"),
        },
        Err(e) => tracing::warn!("subgraph probe failed: {e}"),
    }

    SubgraphStatus {
        endpoint: Some(endpoint.to_string()),
        block_number,
        has_indexing_errors,
    }
}
