//! Response records and their two serializations
//!
//! Store rows project into one canonical record per shape; JSON comes from
//! the serde derives and CSV from the `csv_record` methods over the same
//! fields, so both forms carry identical values by construction. CSV column
//! orders are fixed and documented by the header consts.

use serde::Serialize;

use crate::database::{AggRow, PoolRow, RankedFeesRow, RankedVolumeRow, SyncCounts, TokenRow};
use crate::filters::VolumeSide;
use crate::window::Window;

// ============================================================================
// Core Records
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TokenOut {
    pub address: String,
    pub symbol: Option<String>,
    pub decimals: i32,
}

impl From<TokenRow> for TokenOut {
    fn from(r: TokenRow) -> Self {
        TokenOut { address: r.address, symbol: r.symbol, decimals: r.decimals }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolOut {
    pub id: String,
    pub version: i16,
    pub chain_id: i64,
    pub token0: TokenOut,
    pub token1: TokenOut,
    pub fee_tier_bps: i32,
    pub tick_spacing: i32,
    pub created_at_ts: i64,
}

impl From<PoolRow> for PoolOut {
    fn from(r: PoolRow) -> Self {
        PoolOut {
            id: r.id,
            version: r.version,
            chain_id: r.chain_id,
            token0: TokenOut { address: r.t0_addr, symbol: r.t0_sym, decimals: r.t0_dec },
            token1: TokenOut { address: r.t1_addr, symbol: r.t1_sym, decimals: r.t1_dec },
            fee_tier_bps: r.fee_tier_bps,
            tick_spacing: r.tick_spacing,
            created_at_ts: r.created_at_ts,
        }
    }
}

impl PoolOut {
    /// CSV cell for a token side: symbol, falling back to the address.
    fn token_label(token: &TokenOut) -> String {
        token.symbol.clone().unwrap_or_else(|| token.address.clone())
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub items: Vec<T>,
}

// ============================================================================
// Ranked Entries
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TopFeesEntry {
    pub pool: PoolOut,
    pub fees_sum: f64,
    pub window: Window,
}

impl TopFeesEntry {
    pub const CSV_HEADER: [&'static str; 10] = [
        "pool_id",
        "version",
        "chain_id",
        "token0",
        "token1",
        "fee_tier_bps",
        "tick_spacing",
        "created_at_ts",
        "fees_sum",
        "window",
    ];

    pub fn from_row(row: RankedFeesRow, window: Window) -> Self {
        TopFeesEntry { pool: row.pool.into(), fees_sum: row.fees_sum, window }
    }

    pub fn csv_record(&self) -> [String; 10] {
        [
            self.pool.id.clone(),
            self.pool.version.to_string(),
            self.pool.chain_id.to_string(),
            PoolOut::token_label(&self.pool.token0),
            PoolOut::token_label(&self.pool.token1),
            self.pool.fee_tier_bps.to_string(),
            self.pool.tick_spacing.to_string(),
            self.pool.created_at_ts.to_string(),
            self.fees_sum.to_string(),
            self.window.as_str().to_string(),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopVolumeEntry {
    pub pool: PoolOut,
    pub volume_sum: f64,
    pub swaps_sum: i64,
    pub side: VolumeSide,
    pub window: Window,
}

impl TopVolumeEntry {
    pub const CSV_HEADER: [&'static str; 12] = [
        "pool_id",
        "version",
        "chain_id",
        "token0",
        "token1",
        "fee_tier_bps",
        "tick_spacing",
        "created_at_ts",
        "volume_sum",
        "swaps_sum",
        "side",
        "window",
    ];

    pub fn from_row(row: RankedVolumeRow, side: VolumeSide, window: Window) -> Self {
        TopVolumeEntry {
            pool: row.pool.into(),
            volume_sum: row.volume_sum,
            swaps_sum: row.swaps,
            side,
            window,
        }
    }

    pub fn csv_record(&self) -> [String; 12] {
        [
            self.pool.id.clone(),
            self.pool.version.to_string(),
            self.pool.chain_id.to_string(),
            PoolOut::token_label(&self.pool.token0),
            PoolOut::token_label(&self.pool.token1),
            self.pool.fee_tier_bps.to_string(),
            self.pool.tick_spacing.to_string(),
            self.pool.created_at_ts.to_string(),
            self.volume_sum.to_string(),
            self.swaps_sum.to_string(),
            self.side.as_str().to_string(),
            self.window.as_str().to_string(),
        ]
    }
}

// ============================================================================
// Per-Pool Aggregate Series
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AggBucketOut {
    pub bucket: i64,
    pub volume_token0: f64,
    pub volume_token1: f64,
    pub approx_fee_token0: f64,
    pub approx_fee_token1: f64,
    pub swap_count: i64,
}

impl From<AggRow> for AggBucketOut {
    fn from(r: AggRow) -> Self {
        AggBucketOut {
            bucket: r.bucket,
            volume_token0: r.volume_token0,
            volume_token1: r.volume_token1,
            approx_fee_token0: r.approx_fee_token0,
            approx_fee_token1: r.approx_fee_token1,
            swap_count: r.swap_count,
        }
    }
}

impl AggBucketOut {
    pub const CSV_HEADER: [&'static str; 8] = [
        "pool_id",
        "window",
        "bucket",
        "volume_token0",
        "volume_token1",
        "approx_fee_token0",
        "approx_fee_token1",
        "swap_count",
    ];

    pub fn csv_record(&self, pool_id: &str, window: Window) -> [String; 8] {
        [
            pool_id.to_string(),
            window.as_str().to_string(),
            self.bucket.to_string(),
            self.volume_token0.to_string(),
            self.volume_token1.to_string(),
            self.approx_fee_token0.to_string(),
            self.approx_fee_token1.to_string(),
            self.swap_count.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolAggResponse {
    pub pool: PoolOut,
    pub window: Window,
    pub rows: Vec<AggBucketOut>,
}

// ============================================================================
// Metrics Summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VersionBreakdown {
    pub version: i16,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeeTierBreakdown {
    pub fee_tier_bps: i32,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total: i64,
    pub by_version: Vec<VersionBreakdown>,
    pub by_fee_tier: Vec<FeeTierBreakdown>,
    pub cache_ttl_seconds: u64,
}

// ============================================================================
// Sync Status
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DbSyncStatus {
    pub pools: i64,
    pub pool_day_rows: i64,
    pub pool_hour_rows: i64,
    pub max_day_id: i64,
    pub max_hour_id: i64,
}

impl From<SyncCounts> for DbSyncStatus {
    fn from(c: SyncCounts) -> Self {
        DbSyncStatus {
            pools: c.pools,
            pool_day_rows: c.pool_day_rows,
            pool_hour_rows: c.pool_hour_rows,
            max_day_id: c.max_day_id,
            max_hour_id: c.max_hour_id,
        }
    }
}

/// Upstream indexer probe result. Probe failures leave the fields null
/// rather than failing the status request.
#[derive(Debug, Clone, Serialize)]
pub struct SubgraphStatus {
    pub endpoint: Option<String>,
    pub block_number: Option<i64>,
    pub has_indexing_errors: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub db: DbSyncStatus,
    pub subgraph: SubgraphStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pool() -> PoolOut {
        PoolOut {
            id: "0xpool".into(),
            version: 3,
            chain_id: 1,
            token0: TokenOut {
                address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".into(),
                symbol: Some("WETH".into()),
                decimals: 18,
            },
            token1: TokenOut {
                address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".into(),
                symbol: None,
                decimals: 6,
            },
            fee_tier_bps: 30,
            tick_spacing: 60,
            created_at_ts: 1_620_000_000,
        }
    }

    #[test]
    fn fees_entry_json_and_csv_carry_identical_values() {
        let entry = TopFeesEntry { pool: sample_pool(), fees_sum: 1234.56, window: Window::Day };
        let json = serde_json::to_value(&entry).unwrap();
        let rec = entry.csv_record();

        assert_eq!(json["pool"]["id"].as_str().unwrap(), rec[0]);
        assert_eq!(json["pool"]["version"].as_i64().unwrap().to_string(), rec[1]);
        assert_eq!(json["fees_sum"].as_f64().unwrap(), rec[8].parse::<f64>().unwrap());
        assert_eq!(json["window"].as_str().unwrap(), rec[9]);
        // symbol present on token0, address fallback on token1
        assert_eq!(rec[3], "WETH");
        assert_eq!(rec[4], "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    }

    #[test]
    fn volume_entry_json_and_csv_carry_identical_values() {
        let entry = TopVolumeEntry {
            pool: sample_pool(),
            volume_sum: 9_876_543.21,
            swaps_sum: 42,
            side: VolumeSide::Token0,
            window: Window::Hour,
        };
        let json = serde_json::to_value(&entry).unwrap();
        let rec = entry.csv_record();

        assert_eq!(json["volume_sum"].as_f64().unwrap(), rec[8].parse::<f64>().unwrap());
        assert_eq!(json["swaps_sum"].as_i64().unwrap(), rec[9].parse::<i64>().unwrap());
        assert_eq!(json["side"].as_str().unwrap(), rec[10]);
        assert_eq!(json["window"].as_str().unwrap(), rec[11]);
    }

    #[test]
    fn agg_row_json_and_csv_carry_identical_values() {
        let row = AggBucketOut {
            bucket: 19_702,
            volume_token0: 1.5,
            volume_token1: 2.5,
            approx_fee_token0: 0.0045,
            approx_fee_token1: 0.0075,
            swap_count: 7,
        };
        let json = serde_json::to_value(&row).unwrap();
        let rec = row.csv_record("0xpool", Window::Day);

        assert_eq!(rec[0], "0xpool");
        assert_eq!(rec[1], "day");
        assert_eq!(json["bucket"].as_i64().unwrap().to_string(), rec[2]);
        assert_eq!(json["volume_token0"].as_f64().unwrap(), rec[3].parse::<f64>().unwrap());
        assert_eq!(json["approx_fee_token1"].as_f64().unwrap(), rec[6].parse::<f64>().unwrap());
        assert_eq!(json["swap_count"].as_i64().unwrap(), rec[7].parse::<i64>().unwrap());
    }

    #[test]
    fn csv_headers_match_record_widths() {
        let fees = TopFeesEntry { pool: sample_pool(), fees_sum: 0.0, window: Window::Day };
        assert_eq!(TopFeesEntry::CSV_HEADER.len(), fees.csv_record().len());

        let vol = TopVolumeEntry {
            pool: sample_pool(),
            volume_sum: 0.0,
            swaps_sum: 0,
            side: VolumeSide::Both,
            window: Window::Day,
        };
        assert_eq!(TopVolumeEntry::CSV_HEADER.len(), vol.csv_record().len());
    }
}
