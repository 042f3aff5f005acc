//! Windowed aggregate endpoints: top-by-fees, top-by-volume, per-pool series
//!
//! Rankings group bucket rows by pool within the resolved window, order by
//! the ranking sum, and paginate over the groups. The count query counts
//! distinct pool groups, never raw bucket rows.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::app_error::AppError;
use crate::app_state::AppState;
use crate::cache::signature;
use crate::filters::{PoolFilter, VolumeSide};
use crate::models::{AggBucketOut, Page, PoolAggResponse, TopFeesEntry, TopVolumeEntry};
use crate::pagination::{bounded_limit, Pagination};
use crate::window::{resolve_threshold, validate_lookback, Window};

#[derive(Debug, Deserialize)]
pub struct TopPoolsQuery {
    pub window: Option<Window>,
    pub side: Option<VolumeSide>,
    pub lookback: Option<i64>,
    pub since_day_id: Option<i64>,
    pub since_hour_id: Option<i64>,
    pub version: Option<i16>,
    pub token: Option<String>,
    pub token_symbol: Option<String>,
    pub fee_min: Option<i32>,
    pub fee_max: Option<i32>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub limit: Option<u32>,
}

struct ResolvedTopQuery {
    filter: PoolFilter,
    window: Window,
    threshold: i64,
    pg: Pagination,
    key_params: Vec<(&'static str, String)>,
}

/// Shared validation and window resolution for the two ranking endpoints.
fn resolve_top_query(params: TopPoolsQuery) -> Result<ResolvedTopQuery, AppError> {
    let filter = PoolFilter::resolve(
        params.version,
        params.token,
        params.token_symbol,
        params.fee_min,
        params.fee_max,
    )?;
    let window = params.window.unwrap_or_default();
    let lookback = validate_lookback(params.lookback)?;
    // a bare limit overrides page_size
    let pg = Pagination::resolve(params.page, params.limit.or(params.page_size))?;
    let threshold = resolve_threshold(
        window,
        lookback,
        params.since_day_id,
        params.since_hour_id,
        Utc::now().timestamp(),
    );

    let mut key_params = filter.signature_params();
    key_params.push(("window", window.as_str().to_string()));
    key_params.push(("lookback", lookback.to_string()));
    key_params.push((
        "since_day_id",
        params.since_day_id.map(|v| v.to_string()).unwrap_or_default(),
    ));
    key_params.push((
        "since_hour_id",
        params.since_hour_id.map(|v| v.to_string()).unwrap_or_default(),
    ));
    key_params.push(("page", pg.page.to_string()));
    key_params.push(("page_size", pg.page_size.to_string()));

    Ok(ResolvedTopQuery { filter, window, threshold, pg, key_params })
}

/// GET /pools/top_fees - pools ranked by summed approximate fees
pub async fn top_fees(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopPoolsQuery>,
) -> Result<Json<Page<TopFeesEntry>>, AppError> {
    let q = resolve_top_query(params)?;
    let key = signature("top_fees", &q.key_params);

    if let Some(hit) = state.cache_top_fees.get(&key).await {
        return Ok(Json(hit));
    }

    let total = state
        .db
        .count_ranked_pools(&q.filter, q.window, q.threshold)
        .await?;
    let rows = state
        .db
        .top_pools_by_fees(&q.filter, q.window, q.threshold, q.pg.limit(), q.pg.offset())
        .await?;
    let items: Vec<TopFeesEntry> = rows
        .into_iter()
        .map(|r| TopFeesEntry::from_row(r, q.window))
        .collect();

    let page = Page { page: q.pg.page, page_size: q.pg.page_size, total, items };
    state.cache_top_fees.set(&key, page.clone()).await;
    Ok(Json(page))
}

/// GET /pools/top_volume - pools ranked by summed volume for the side
pub async fn top_volume(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopPoolsQuery>,
) -> Result<Json<Page<TopVolumeEntry>>, AppError> {
    let side = params.side.unwrap_or_default();
    let mut q = resolve_top_query(params)?;
    q.key_params.push(("side", side.as_str().to_string()));
    let key = signature("top_volume", &q.key_params);

    if let Some(hit) = state.cache_top_volume.get(&key).await {
        return Ok(Json(hit));
    }

    let total = state
        .db
        .count_ranked_pools(&q.filter, q.window, q.threshold)
        .await?;
    let rows = state
        .db
        .top_pools_by_volume(&q.filter, q.window, q.threshold, side, q.pg.limit(), q.pg.offset())
        .await?;
    let items: Vec<TopVolumeEntry> = rows
        .into_iter()
        .map(|r| TopVolumeEntry::from_row(r, side, q.window))
        .collect();

    let page = Page { page: q.pg.page, page_size: q.pg.page_size, total, items };
    state.cache_top_volume.set(&key, page.clone()).await;
    Ok(Json(page))
}

// ============================================================================
// Per-Pool Aggregate Series
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PoolAggQuery {
    pub window: Option<Window>,
    pub lookback: Option<i64>,
    pub since_day_id: Option<i64>,
    pub since_hour_id: Option<i64>,
    pub limit: Option<u32>,
}

/// GET /pools/{pool_id}/agg - bucket rows for one pool, newest first
pub async fn pool_agg(
    State(state): State<Arc<AppState>>,
    Path(pool_id): Path<String>,
    Query(params): Query<PoolAggQuery>,
) -> Result<Json<PoolAggResponse>, AppError> {
    let window = params.window.unwrap_or_default();
    let lookback = validate_lookback(params.lookback)?;
    let limit = bounded_limit(params.limit, 100, 1000)?;
    let threshold = resolve_threshold(
        window,
        lookback,
        params.since_day_id,
        params.since_hour_id,
        Utc::now().timestamp(),
    );

    let pool = state
        .db
        .get_pool(&pool_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let rows = state
        .db
        .pool_agg_rows(&pool_id, window, threshold, limit)
        .await?
        .into_iter()
        .map(AggBucketOut::from)
        .collect();

    Ok(Json(PoolAggResponse { pool: pool.into(), window, rows }))
}
