//! Delimited tabular exports
//!
//! The export endpoints run the same ranked and per-pool queries as their
//! JSON counterparts and serialize the same canonical records through the
//! fixed-column CSV writers, so both output forms carry identical values.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::app_error::AppError;
use crate::app_state::AppState;
use crate::filters::{PoolFilter, VolumeSide};
use crate::models::{AggBucketOut, TopFeesEntry, TopVolumeEntry};
use crate::pagination::bounded_limit;
use crate::window::{resolve_threshold, validate_lookback, Window};

#[derive(Debug, Deserialize)]
pub struct ExportTopQuery {
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
    pub limit: Option<u32>,
}

fn csv_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "text/csv")], bytes).into_response()
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    wtr.into_inner()
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!("csv writer flush: {e}")))
}

/// GET /export/top_fees.csv
pub async fn export_top_fees(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportTopQuery>,
) -> Result<Response, AppError> {
    let filter = PoolFilter::resolve(
        params.version,
        params.token,
        params.token_symbol,
        params.fee_min,
        params.fee_max,
    )?;
    let window = params.window.unwrap_or_default();
    let lookback = validate_lookback(params.lookback)?;
    let limit = bounded_limit(params.limit, 100, 100)?;
    let threshold = resolve_threshold(
        window,
        lookback,
        params.since_day_id,
        params.since_hour_id,
        Utc::now().timestamp(),
    );

    let rows = state
        .db
        .top_pools_by_fees(&filter, window, threshold, limit, 0)
        .await?;

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(TopFeesEntry::CSV_HEADER)?;
    for row in rows {
        let entry = TopFeesEntry::from_row(row, window);
        wtr.write_record(entry.csv_record())?;
    }
    Ok(csv_response(finish_csv(wtr)?))
}

/// GET /export/top_volume.csv
pub async fn export_top_volume(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportTopQuery>,
) -> Result<Response, AppError> {
    let filter = PoolFilter::resolve(
        params.version,
        params.token,
        params.token_symbol,
        params.fee_min,
        params.fee_max,
    )?;
    let window = params.window.unwrap_or_default();
    let side = params.side.unwrap_or_default();
    let lookback = validate_lookback(params.lookback)?;
    let limit = bounded_limit(params.limit, 100, 100)?;
    let threshold = resolve_threshold(
        window,
        lookback,
        params.since_day_id,
        params.since_hour_id,
        Utc::now().timestamp(),
    );

    let rows = state
        .db
        .top_pools_by_volume(&filter, window, threshold, side, limit, 0)
        .await?;

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(TopVolumeEntry::CSV_HEADER)?;
    for row in rows {
        let entry = TopVolumeEntry::from_row(row, side, window);
        wtr.write_record(entry.csv_record())?;
    }
    Ok(csv_response(finish_csv(wtr)?))
}

// ============================================================================
// Per-Pool Aggregate Export
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExportPoolAggQuery {
    pub pool_id: String,
    pub window: Option<Window>,
    pub lookback: Option<i64>,
    pub since_day_id: Option<i64>,
    pub since_hour_id: Option<i64>,
    pub limit: Option<u32>,
}

/// GET /export/pool_agg.csv
pub async fn export_pool_agg(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExportPoolAggQuery>,
) -> Result<Response, AppError> {
    let window = params.window.unwrap_or_default();
    let lookback = validate_lookback(params.lookback)?;
    let limit = bounded_limit(params.limit, 100, 10_000)?;
    let threshold = resolve_threshold(
        window,
        lookback,
        params.since_day_id,
        params.since_hour_id,
        Utc::now().timestamp(),
    );

    state
        .db
        .get_pool(&params.pool_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let rows = state
        .db
        .pool_agg_rows(&params.pool_id, window, threshold, limit)
        .await?;

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(AggBucketOut::CSV_HEADER)?;
    for row in rows {
        let out = AggBucketOut::from(row);
        wtr.write_record(out.csv_record(&params.pool_id, window))?;
    }
    Ok(csv_response(finish_csv(wtr)?))
}
