//! Central application state shared across all handlers.

use std::time::Duration;

use sqlx::PgPool;

use crate::cache::TtlCache;
use crate::database::Database;
use crate::models::{MetricsSummary, Page, PoolOut, TokenOut, TopFeesEntry, TopVolumeEntry};

/// Per-endpoint cache settings (ttl seconds, max entries).
const TOKENS_CACHE: (u64, usize) = (60, 200);
const POOLS_CACHE: (u64, usize) = (30, 500);
const METRICS_CACHE: (u64, usize) = (30, 200);
const TOP_CACHE: (u64, usize) = (15, 200);

pub struct AppState {
    pub db: Database,

    // Upstream indexer probe (status endpoint only)
    pub http: reqwest::Client,
    pub graph_endpoint: Option<String>,

    // Response caches, one instance per endpoint
    pub cache_tokens: TtlCache<Page<TokenOut>>,
    pub cache_pools: TtlCache<Page<PoolOut>>,
    pub cache_metrics: TtlCache<MetricsSummary>,
    pub cache_top_fees: TtlCache<Page<TopFeesEntry>>,
    pub cache_top_volume: TtlCache<Page<TopVolumeEntry>>,
}

impl AppState {
    pub fn new(pool: PgPool, graph_endpoint: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        AppState {
            db: Database::new(pool),
            http,
            graph_endpoint,
            cache_tokens: TtlCache::new(TOKENS_CACHE.0, TOKENS_CACHE.1),
            cache_pools: TtlCache::new(POOLS_CACHE.0, POOLS_CACHE.1),
            cache_metrics: TtlCache::new(METRICS_CACHE.0, METRICS_CACHE.1),
            cache_top_fees: TtlCache::new(TOP_CACHE.0, TOP_CACHE.1),
            cache_top_volume: TtlCache::new(TOP_CACHE.0, TOP_CACHE.1),
        }
    }
}
