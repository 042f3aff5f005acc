//! Read-only store access
//!
//! All queries are parameterized; the only text spliced into SQL comes from
//! the fixed fragments in `filters` and the closed identifier sets on
//! `Window`, `PoolOrder`, `OrderDir` and `VolumeSide`. The pool, token and
//! aggregate tables are populated out-of-band by the ingestion pipeline and
//! are never written here.

use sqlx::prelude::FromRow;
use sqlx::PgPool;

use crate::filters::{OrderDir, PoolFilter, PoolOrder, VolumeSide, POOL_FILTER_WHERE};
use crate::window::Window;

/// Binds the five pool-filter parameters (`$1`..`$5`) in their documented
/// order, so count and data queries always share identical binds.
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {
        $query
            .bind($filter.version)
            .bind($filter.token.as_deref())
            .bind($filter.token_symbol.as_deref())
            .bind($filter.fee_min)
            .bind($filter.fee_max)
    };
}

const POOL_COLUMNS: &str = "\
    p.id, p.version, p.chain_id, p.fee_tier_bps, p.tick_spacing, p.created_at_ts, \
    t0.address as t0_addr, t0.symbol as t0_sym, t0.decimals as t0_dec, \
    t1.address as t1_addr, t1.symbol as t1_sym, t1.decimals as t1_dec";

const POOL_JOIN: &str = "\
    from pools p \
    join tokens t0 on t0.id = p.token0_id \
    join tokens t1 on t1.id = p.token1_id";

const POOL_GROUP_BY: &str = "\
    p.id, p.version, p.chain_id, p.fee_tier_bps, p.tick_spacing, p.created_at_ts, \
    t0.address, t0.symbol, t0.decimals, t1.address, t1.symbol, t1.decimals";

// ============================================================================
// Row Types
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub address: String,
    pub symbol: Option<String>,
    pub decimals: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct PoolRow {
    pub id: String,
    pub version: i16,
    pub chain_id: i64,
    pub fee_tier_bps: i32,
    pub tick_spacing: i32,
    pub created_at_ts: i64,
    pub t0_addr: String,
    pub t0_sym: Option<String>,
    pub t0_dec: i32,
    pub t1_addr: String,
    pub t1_sym: Option<String>,
    pub t1_dec: i32,
}

/// Pool row plus its fee ranking sum over the window.
#[derive(Debug, Clone, FromRow)]
pub struct RankedFeesRow {
    #[sqlx(flatten)]
    pub pool: PoolRow,
    pub fees_sum: f64,
}

/// Pool row plus its volume ranking sum and swap count over the window.
#[derive(Debug, Clone, FromRow)]
pub struct RankedVolumeRow {
    #[sqlx(flatten)]
    pub pool: PoolRow,
    pub volume_sum: f64,
    pub swaps: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct AggRow {
    pub bucket: i64,
    pub volume_token0: f64,
    pub volume_token1: f64,
    pub approx_fee_token0: f64,
    pub approx_fee_token1: f64,
    pub swap_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct VersionCountRow {
    pub version: i16,
    pub cnt: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct FeeTierCountRow {
    pub fee: i32,
    pub cnt: i64,
}

#[derive(Debug, Clone)]
pub struct SyncCounts {
    pub pools: i64,
    pub pool_day_rows: i64,
    pub pool_hour_rows: i64,
    pub max_day_id: i64,
    pub max_hour_id: i64,
}

// ============================================================================
// Database
// ============================================================================

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Database { pool }
    }

    // -------- tokens --------

    pub async fn count_tokens(&self, q: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "select count(*) from tokens t \
             where ($1::text is null or t.symbol ilike '%' || $1 || '%')",
        )
        .bind(q)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_tokens(
        &self,
        q: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TokenRow>, sqlx::Error> {
        sqlx::query_as(
            "select t.address, t.symbol, t.decimals from tokens t \
             where ($1::text is null or t.symbol ilike '%' || $1 || '%') \
             order by coalesce(t.symbol,'') asc, t.address asc \
             limit $2 offset $3",
        )
        .bind(q)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    // -------- pools --------

    pub async fn count_pools(&self, filter: &PoolFilter) -> Result<i64, sqlx::Error> {
        let sql = format!("select count(*) {POOL_JOIN} where {POOL_FILTER_WHERE}");
        bind_filter!(sqlx::query_scalar(&sql), filter)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn list_pools(
        &self,
        filter: &PoolFilter,
        order_by: PoolOrder,
        order_dir: OrderDir,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PoolRow>, sqlx::Error> {
        let sql = format!(
            "select {POOL_COLUMNS} {POOL_JOIN} where {POOL_FILTER_WHERE} \
             order by {} {} limit $6 offset $7",
            order_by.column(),
            order_dir.sql(),
        );
        bind_filter!(sqlx::query_as(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_pool(&self, pool_id: &str) -> Result<Option<PoolRow>, sqlx::Error> {
        let sql = format!("select {POOL_COLUMNS} {POOL_JOIN} where p.id = $1");
        sqlx::query_as(&sql)
            .bind(pool_id)
            .fetch_optional(&self.pool)
            .await
    }

    // -------- metrics summary --------

    pub async fn pools_by_version(
        &self,
        filter: &PoolFilter,
    ) -> Result<Vec<VersionCountRow>, sqlx::Error> {
        let sql = format!(
            "select p.version as version, count(*)::bigint as cnt \
             {POOL_JOIN} where {POOL_FILTER_WHERE} \
             group by p.version order by p.version asc",
        );
        bind_filter!(sqlx::query_as(&sql), filter)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn pools_by_fee_tier(
        &self,
        filter: &PoolFilter,
    ) -> Result<Vec<FeeTierCountRow>, sqlx::Error> {
        let sql = format!(
            "select p.fee_tier_bps as fee, count(*)::bigint as cnt \
             {POOL_JOIN} where {POOL_FILTER_WHERE} \
             group by p.fee_tier_bps order by p.fee_tier_bps asc",
        );
        bind_filter!(sqlx::query_as(&sql), filter)
            .fetch_all(&self.pool)
            .await
    }

    // -------- ranking over window buckets --------

    /// Counts distinct pool groups matching the filter within the window,
    /// not raw bucket rows.
    pub async fn count_ranked_pools(
        &self,
        filter: &PoolFilter,
        window: Window,
        threshold: i64,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!(
            "select count(*) from ( \
               select p.id \
               from {table} a \
               join pools p on p.id = a.pool_id \
               join tokens t0 on t0.id = p.token0_id \
               join tokens t1 on t1.id = p.token1_id \
               where {POOL_FILTER_WHERE} and a.{bucket} >= $6 \
               group by p.id \
             ) s",
            table = window.agg_table(),
            bucket = window.bucket_column(),
        );
        bind_filter!(sqlx::query_scalar(&sql), filter)
            .bind(threshold)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn top_pools_by_fees(
        &self,
        filter: &PoolFilter,
        window: Window,
        threshold: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedFeesRow>, sqlx::Error> {
        let sql = format!(
            "select {POOL_COLUMNS}, \
               sum(coalesce(a.approx_fee_token0,0) + coalesce(a.approx_fee_token1,0))::double precision as fees_sum \
             from {table} a \
             join pools p on p.id = a.pool_id \
             join tokens t0 on t0.id = p.token0_id \
             join tokens t1 on t1.id = p.token1_id \
             where {POOL_FILTER_WHERE} and a.{bucket} >= $6 \
             group by {POOL_GROUP_BY} \
             order by fees_sum desc, p.id asc \
             limit $7 offset $8",
            table = window.agg_table(),
            bucket = window.bucket_column(),
        );
        bind_filter!(sqlx::query_as(&sql), filter)
            .bind(threshold)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn top_pools_by_volume(
        &self,
        filter: &PoolFilter,
        window: Window,
        threshold: i64,
        side: VolumeSide,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RankedVolumeRow>, sqlx::Error> {
        let sql = format!(
            "select {POOL_COLUMNS}, \
               {vol}::double precision as volume_sum, \
               sum(coalesce(a.swap_count,0))::bigint as swaps \
             from {table} a \
             join pools p on p.id = a.pool_id \
             join tokens t0 on t0.id = p.token0_id \
             join tokens t1 on t1.id = p.token1_id \
             where {POOL_FILTER_WHERE} and a.{bucket} >= $6 \
             group by {POOL_GROUP_BY} \
             order by volume_sum desc, p.id asc \
             limit $7 offset $8",
            vol = side.volume_expr(),
            table = window.agg_table(),
            bucket = window.bucket_column(),
        );
        bind_filter!(sqlx::query_as(&sql), filter)
            .bind(threshold)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    // -------- per-pool aggregate series --------

    pub async fn pool_agg_rows(
        &self,
        pool_id: &str,
        window: Window,
        threshold: i64,
        limit: i64,
    ) -> Result<Vec<AggRow>, sqlx::Error> {
        let sql = format!(
            "select \
               a.{bucket} as bucket, \
               coalesce(a.volume_token0,0)::double precision as volume_token0, \
               coalesce(a.volume_token1,0)::double precision as volume_token1, \
               coalesce(a.approx_fee_token0,0)::double precision as approx_fee_token0, \
               coalesce(a.approx_fee_token1,0)::double precision as approx_fee_token1, \
               coalesce(a.swap_count,0)::bigint as swap_count \
             from {table} a \
             where a.pool_id = $1 and a.{bucket} >= $2 \
             order by a.{bucket} desc \
             limit $3",
            table = window.agg_table(),
            bucket = window.bucket_column(),
        );
        sqlx::query_as(&sql)
            .bind(pool_id)
            .bind(threshold)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    // -------- sync status --------

    pub async fn sync_counts(&self) -> Result<SyncCounts, sqlx::Error> {
        let pools: i64 = sqlx::query_scalar("select count(*) from pools")
            .fetch_one(&self.pool)
            .await?;
        let pool_day_rows: i64 = sqlx::query_scalar("select count(*) from pool_day_data")
            .fetch_one(&self.pool)
            .await?;
        let pool_hour_rows: i64 = sqlx::query_scalar("select count(*) from pool_hour_data")
            .fetch_one(&self.pool)
            .await?;
        let max_day_id: i64 =
            sqlx::query_scalar("select coalesce(max(date),0)::bigint from pool_day_data")
                .fetch_one(&self.pool)
                .await?;
        let max_hour_id: i64 =
            sqlx::query_scalar("select coalesce(max(hour_start_unix),0)::bigint from pool_hour_data")
                .fetch_one(&self.pool)
                .await?;
        Ok(SyncCounts { pools, pool_day_rows, pool_hour_rows, max_day_id, max_hour_id })
    }
}
