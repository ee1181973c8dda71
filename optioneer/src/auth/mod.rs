//! Authentication: password hashing, JWT sessions, and the embed trust
//! boundary.
//!
//! Two kinds of callers exist. Dashboard requests carry a JWT session cookie
//! and resolve to a [`crate::api::models::clients::CurrentClient`] via the
//! extractor in [`current_client`]. Embed requests carry a per-client public
//! key plus a declared origin and resolve to an [`embed::EmbedContext`]. Both
//! are resolved once at the boundary and passed into handlers explicitly.

pub mod current_client;
pub mod embed;
pub mod password;
pub mod session;
