//! Database models for quotes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{ClientId, ConfiguratorId, QuoteId};

/// Quote lifecycle states.
///
/// Created as `Pending` on submission; advanced by explicit client action.
/// Transition legality is only checked when `quotes.enforce_transitions` is
/// enabled (see [`QuoteStatus::can_transition_to`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "quote_status", rename_all = "lowercase")]
pub enum QuoteStatus {
    Draft,
    Pending,
    Sent,
    Accepted,
    Rejected,
    Expired,
    Converted,
}

impl QuoteStatus {
    /// Terminal states admit no further transitions when enforcement is on.
    pub fn is_terminal(self) -> bool {
        matches!(self, QuoteStatus::Rejected | QuoteStatus::Expired | QuoteStatus::Converted)
    }

    /// Whether a transition to `next` is legal under enforcement.
    ///
    /// Accepted quotes may still convert; everything else decided is final.
    /// Self-transitions are always allowed (idempotent updates).
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        if self == next {
            return true;
        }
        match self {
            QuoteStatus::Accepted => next == QuoteStatus::Converted,
            status if status.is_terminal() => false,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuoteDBResponse {
    pub id: QuoteId,
    pub client_id: ClientId,
    pub configurator_id: Option<ConfiguratorId>,
    /// Public lookup key; the only credential needed to view the quote
    pub quote_code: String,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub customer_message: Option<String>,
    /// Snapshot of the selection at submission time
    pub selected_options: serde_json::Value,
    pub configuration: serde_json::Value,
    pub total_price: Decimal,
    pub currency_code: String,
    pub status: QuoteStatus,
    /// Engagement signal bumped on each public read; not a security control
    pub open_count: i32,
    pub last_opened_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QuoteCreateDBRequest {
    pub client_id: ClientId,
    pub configurator_id: Option<ConfiguratorId>,
    pub quote_code: String,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub customer_message: Option<String>,
    pub selected_options: serde_json::Value,
    pub configuration: serde_json::Value,
    pub total_price: Decimal,
    pub currency_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteUpdateDBRequest {
    pub status: Option<QuoteStatus>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub customer_message: Option<String>,
    pub total_price: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_move_anywhere() {
        for next in [
            QuoteStatus::Draft,
            QuoteStatus::Sent,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
            QuoteStatus::Expired,
            QuoteStatus::Converted,
        ] {
            assert!(QuoteStatus::Pending.can_transition_to(next), "pending -> {next:?}");
        }
    }

    #[test]
    fn test_accepted_only_converts() {
        assert!(QuoteStatus::Accepted.can_transition_to(QuoteStatus::Converted));
        assert!(QuoteStatus::Accepted.can_transition_to(QuoteStatus::Accepted));
        assert!(!QuoteStatus::Accepted.can_transition_to(QuoteStatus::Pending));
        assert!(!QuoteStatus::Accepted.can_transition_to(QuoteStatus::Rejected));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [QuoteStatus::Rejected, QuoteStatus::Expired, QuoteStatus::Converted] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(QuoteStatus::Pending));
            // Idempotent self-transition stays legal
            assert!(terminal.can_transition_to(terminal));
        }
    }
}
