//! Time-window resolution for aggregate queries
//!
//! A window is a granularity (day or hour) plus an inclusive lower-bound
//! bucket threshold. The granularity also selects which aggregate table and
//! bucket column a query targets; both identifiers come from the closed
//! two-element set below and are never derived from request text.

use serde::{Deserialize, Serialize};

use crate::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    #[default]
    Day,
    Hour,
}

impl Window {
    pub fn bucket_seconds(self) -> i64 {
        match self {
            Window::Day => 86_400,
            Window::Hour => 3_600,
        }
    }

    pub fn agg_table(self) -> &'static str {
        match self {
            Window::Day => "pool_day_data",
            Window::Hour => "pool_hour_data",
        }
    }

    pub fn bucket_column(self) -> &'static str {
        match self {
            Window::Day => "date",
            Window::Hour => "hour_start_unix",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Window::Day => "day",
            Window::Hour => "hour",
        }
    }
}

pub const DEFAULT_LOOKBACK: i64 = 30;

/// Resolves the inclusive lower-bound bucket id for a window.
///
/// An explicit since id matching the granularity wins (lets callers resume
/// from a known bucket); otherwise the threshold is the current bucket index
/// minus the lookback. `now_ts` is injected so callers and tests control the
/// wall clock.
pub fn resolve_threshold(
    window: Window,
    lookback: i64,
    since_day_id: Option<i64>,
    since_hour_id: Option<i64>,
    now_ts: i64,
) -> i64 {
    let explicit = match window {
        Window::Day => since_day_id,
        Window::Hour => since_hour_id,
    };
    match explicit {
        Some(id) => id,
        None => now_ts / window.bucket_seconds() - lookback,
    }
}

pub fn validate_lookback(lookback: Option<i64>) -> Result<i64, AppError> {
    let lookback = lookback.unwrap_or(DEFAULT_LOOKBACK);
    if lookback < 1 {
        return Err(AppError::BadRequest("lookback must be >= 1".into()));
    }
    Ok(lookback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_threshold_from_lookback() {
        // 2024-01-10 00:00:00 UTC = day index 19732
        let now_ts = 19_732 * 86_400;
        assert_eq!(resolve_threshold(Window::Day, 30, None, None, now_ts), 19_702);
    }

    #[test]
    fn hour_threshold_excludes_bucket_before_window() {
        let hour_index = 473_000;
        let now_ts = hour_index * 3_600 + 1_234;
        let th = resolve_threshold(Window::Hour, 24, None, None, now_ts);
        assert_eq!(th, hour_index - 24);
        // bucket at H-25 falls outside the inclusive lower bound, H-24 inside
        assert!(hour_index - 25 < th);
        assert!(hour_index - 24 >= th);
    }

    #[test]
    fn larger_lookback_gives_earlier_threshold() {
        let now_ts = 1_700_000_000;
        let short = resolve_threshold(Window::Day, 7, None, None, now_ts);
        let long = resolve_threshold(Window::Day, 30, None, None, now_ts);
        assert!(long <= short);
    }

    #[test]
    fn explicit_since_is_used_verbatim() {
        let now_ts = 1_700_000_000;
        assert_eq!(resolve_threshold(Window::Day, 30, Some(19_000), None, now_ts), 19_000);
        assert_eq!(resolve_threshold(Window::Hour, 30, None, Some(400_000), now_ts), 400_000);
        // a since id for the other granularity is ignored
        let th = resolve_threshold(Window::Day, 30, None, Some(400_000), now_ts);
        assert_eq!(th, now_ts / 86_400 - 30);
    }

    #[test]
    fn granularity_selectors_are_fixed() {
        assert_eq!(Window::Day.agg_table(), "pool_day_data");
        assert_eq!(Window::Day.bucket_column(), "date");
        assert_eq!(Window::Hour.agg_table(), "pool_hour_data");
        assert_eq!(Window::Hour.bucket_column(), "hour_start_unix");
    }

    #[test]
    fn lookback_validation() {
        assert_eq!(validate_lookback(None).unwrap(), DEFAULT_LOOKBACK);
        assert_eq!(validate_lookback(Some(5)).unwrap(), 5);
        assert!(validate_lookback(Some(0)).is_err());
        assert!(validate_lookback(Some(-3)).is_err());
    }
}
