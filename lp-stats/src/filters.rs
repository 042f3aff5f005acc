//! Pool filter predicate and identifier allow-lists
//!
//! Every optional filter dimension collapses to a no-op when its parameter
//! is absent, so count and data queries share one fixed predicate with all
//! values bound as parameters. Identifiers (order-by columns, volume
//! expressions) are only ever chosen from the closed sets below.

use serde::Deserialize;

use crate::app_error::AppError;

/// Combined pool filter predicate. Parameters `$1`..`$5`:
/// version, token address, token symbol, fee_min, fee_max.
/// Queries that append further parameters start at `$6`.
pub const POOL_FILTER_WHERE: &str = "\
    ($1::smallint is null or p.version = $1) \
    and ($2::text is null or p.token0_id = $2 or p.token1_id = $2) \
    and ($3::text is null or t0.symbol ilike '%' || $3 || '%' or t1.symbol ilike '%' || $3 || '%') \
    and ($4::integer is null or p.fee_tier_bps >= $4) \
    and ($5::integer is null or p.fee_tier_bps <= $5)";

#[derive(Debug, Clone, Default)]
pub struct PoolFilter {
    pub version: Option<i16>,
    pub token: Option<String>,
    pub token_symbol: Option<String>,
    pub fee_min: Option<i32>,
    pub fee_max: Option<i32>,
}

impl PoolFilter {
    /// Validates and normalizes raw request parameters. Malformed input is
    /// rejected here, before any store access.
    pub fn resolve(
        version: Option<i16>,
        token: Option<String>,
        token_symbol: Option<String>,
        fee_min: Option<i32>,
        fee_max: Option<i32>,
    ) -> Result<Self, AppError> {
        let token = token.map(|t| normalize_token_address(&t)).transpose()?;
        if fee_min.is_some_and(|v| v < 0) {
            return Err(AppError::BadRequest("fee_min must be >= 0".into()));
        }
        if fee_max.is_some_and(|v| v < 0) {
            return Err(AppError::BadRequest("fee_max must be >= 0".into()));
        }
        Ok(PoolFilter { version, token, token_symbol, fee_min, fee_max })
    }

    /// Cache-signature fragment: one entry per filter dimension, resolved
    /// values only.
    pub fn signature_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("version", self.version.map(|v| v.to_string()).unwrap_or_default()),
            ("token", self.token.clone().unwrap_or_default()),
            ("token_symbol", self.token_symbol.clone().unwrap_or_default()),
            ("fee_min", self.fee_min.map(|v| v.to_string()).unwrap_or_default()),
            ("fee_max", self.fee_max.map(|v| v.to_string()).unwrap_or_default()),
        ]
    }
}

/// Lowercases and validates a `0x`-prefixed 40-hex-digit address.
pub fn normalize_token_address(raw: &str) -> Result<String, AppError> {
    let addr = raw.to_ascii_lowercase();
    match addr.strip_prefix("0x") {
        Some(hex) if hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(addr),
        _ => Err(AppError::BadRequest("invalid token address".into())),
    }
}

// ============================================================================
// Order-by and side selectors (closed sets)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolOrder {
    #[default]
    CreatedAtTs,
    FeeTierBps,
}

impl PoolOrder {
    pub fn column(self) -> &'static str {
        match self {
            PoolOrder::CreatedAtTs => "p.created_at_ts",
            PoolOrder::FeeTierBps => "p.fee_tier_bps",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PoolOrder::CreatedAtTs => "created_at_ts",
            PoolOrder::FeeTierBps => "fee_tier_bps",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDir {
    Asc,
    #[default]
    Desc,
}

impl OrderDir {
    pub fn sql(self) -> &'static str {
        match self {
            OrderDir::Asc => "ASC",
            OrderDir::Desc => "DESC",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderDir::Asc => "asc",
            OrderDir::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeSide {
    #[default]
    Both,
    Token0,
    Token1,
}

impl VolumeSide {
    pub fn volume_expr(self) -> &'static str {
        match self {
            VolumeSide::Both => "sum(coalesce(a.volume_token0,0) + coalesce(a.volume_token1,0))",
            VolumeSide::Token0 => "sum(coalesce(a.volume_token0,0))",
            VolumeSide::Token1 => "sum(coalesce(a.volume_token1,0))",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VolumeSide::Both => "both",
            VolumeSide::Token0 => "token0",
            VolumeSide::Token1 => "token1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_lowercased() {
        let addr = normalize_token_address("0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2").unwrap();
        assert_eq!(addr, "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        // wrong length
        assert!(normalize_token_address("0xabc").is_err());
        // missing prefix
        assert!(normalize_token_address("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").is_err());
        // non-hex digit
        assert!(normalize_token_address("0xz02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").is_err());
    }

    #[test]
    fn filter_rejects_negative_fee_bounds() {
        assert!(PoolFilter::resolve(None, None, None, Some(-1), None).is_err());
        assert!(PoolFilter::resolve(None, None, None, None, Some(-1)).is_err());
        assert!(PoolFilter::resolve(Some(3), None, None, Some(0), Some(500)).is_ok());
    }

    #[test]
    fn filter_normalizes_token() {
        let f = PoolFilter::resolve(
            None,
            Some("0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48".into()),
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(f.token.as_deref(), Some("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
    }

    #[test]
    fn order_columns_come_from_allow_list() {
        assert_eq!(PoolOrder::CreatedAtTs.column(), "p.created_at_ts");
        assert_eq!(PoolOrder::FeeTierBps.column(), "p.fee_tier_bps");
        assert_eq!(OrderDir::Asc.sql(), "ASC");
        assert_eq!(OrderDir::Desc.sql(), "DESC");
    }

    #[test]
    fn volume_expr_covers_all_sides() {
        assert!(VolumeSide::Both.volume_expr().contains("volume_token0"));
        assert!(VolumeSide::Both.volume_expr().contains("volume_token1"));
        assert!(!VolumeSide::Token0.volume_expr().contains("volume_token1"));
        assert!(!VolumeSide::Token1.volume_expr().contains("volume_token0"));
    }
}
