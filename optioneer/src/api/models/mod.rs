//! Request/response data structures for the HTTP API.

pub mod auth;
pub mod billing;
pub mod categories;
pub mod clients;
pub mod configurators;
pub mod embed;
pub mod envelope;
pub mod options;
pub mod quotes;
pub mod themes;

use serde::{Deserialize, Deserializer};

/// Deserializer distinguishing "field absent" from "field explicitly null":
/// absent stays `None` (via `#[serde(default)]`), null becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
