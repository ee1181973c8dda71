//! Plan capacity accounting for primary options.
//!
//! Every option created in a primary category counts against the client's
//! plan. The limit is a base allowance plus purchased capacity blocks:
//! `included + charged_blocks × block_size`. The count-and-compare runs
//! inside the option-create transaction (see
//! [`crate::db::handlers::options`]), so two concurrent creates cannot both
//! slip under the cap.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::BillingConfig;

/// Compute the primary-option limit for a client.
pub fn primary_option_limit(config: &BillingConfig, charged_blocks: i32) -> i64 {
    config.included_primary_options + config.block_size * charged_blocks.max(0) as i64
}

/// Usage snapshot returned by `GET /api/v1/billing/usage`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageSummary {
    /// Base allowance before purchased blocks
    pub included: i64,
    /// Current primary-option limit including purchased blocks
    pub limit: i64,
    /// Primary options currently in use across all configurators
    pub used: i64,
    /// Remaining capacity (never negative)
    pub remaining: i64,
    pub limit_reached: bool,
}

impl UsageSummary {
    pub fn new(config: &BillingConfig, charged_blocks: i32, used: i64) -> Self {
        let limit = primary_option_limit(config, charged_blocks);
        Self {
            included: config.included_primary_options,
            limit,
            used,
            remaining: (limit - used).max(0),
            limit_reached: used >= limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BillingConfig {
        BillingConfig::default()
    }

    #[test]
    fn test_limit_formula() {
        assert_eq!(primary_option_limit(&config(), 0), 10);
        assert_eq!(primary_option_limit(&config(), 1), 20);
        assert_eq!(primary_option_limit(&config(), 5), 60);
    }

    #[test]
    fn test_negative_blocks_treated_as_zero() {
        assert_eq!(primary_option_limit(&config(), -3), 10);
    }

    #[test]
    fn test_usage_at_limit() {
        let usage = UsageSummary::new(&config(), 0, 10);
        assert_eq!(usage.limit, 10);
        assert_eq!(usage.remaining, 0);
        assert!(usage.limit_reached);
    }

    #[test]
    fn test_usage_after_block_purchase() {
        // 10 options in use, one purchased block lifts the limit to 20
        let usage = UsageSummary::new(&config(), 1, 10);
        assert_eq!(usage.limit, 20);
        assert_eq!(usage.remaining, 10);
        assert!(!usage.limit_reached);
    }

    #[test]
    fn test_usage_over_limit_clamps_remaining() {
        // A client downgraded below current usage still reports zero remaining
        let usage = UsageSummary::new(&config(), 0, 14);
        assert_eq!(usage.remaining, 0);
        assert!(usage.limit_reached);
    }
}
