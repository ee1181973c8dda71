//! Common type definitions shared across the crate.
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`ClientId`]: tenant account identifier
//! - [`ConfiguratorId`]: configurator identifier
//! - [`CategoryId`]: category identifier
//! - [`OptionId`]: product option identifier
//! - [`ThemeId`]: theme identifier
//! - [`QuoteId`]: quote identifier

use uuid::Uuid;

// Type aliases for IDs
pub type ClientId = Uuid;
pub type ConfiguratorId = Uuid;
pub type CategoryId = Uuid;
pub type OptionId = Uuid;
pub type ThemeId = Uuid;
pub type QuoteId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&uuid), "550e8400");
    }
}
