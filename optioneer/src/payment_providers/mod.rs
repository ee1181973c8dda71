//! Payment provider integrations for capacity-block purchases.
//!
//! One provider is configured at a time via `payment.provider`. Fulfillment
//! is driven by two redundant paths - the signed webhook and the dashboard's
//! explicit verify call - and is idempotent across both: the purchase ledger
//! keys on the payment-session id, so replays never double-increment.

pub mod stripe;
