use base64::{engine::general_purpose, Engine as _};
use rand::{thread_rng, Rng};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a cryptographically secure client public key with 256 bits of entropy.
///
/// The key is formatted as `pk-{base64url_encoded_random_bytes}` where the
/// random bytes are 32 bytes (256 bits) of cryptographically secure random data.
/// The key is an opaque bearer credential for embed reads; it is scoped further
/// by the client's domain allow-list.
pub fn generate_public_key() -> String {
    // Generate 32 bytes (256 bits) of cryptographically secure random data
    let mut key_bytes = [0u8; 32];
    thread_rng().fill(&mut key_bytes);

    format!("pk-{}", general_purpose::URL_SAFE_NO_PAD.encode(key_bytes))
}

/// Generates an opaque shareable public id for a configurator.
///
/// Format: `cfg-{12 lowercase alphanumeric characters}`. Public ids are what
/// embeds reference; the private UUID never leaves the dashboard API.
pub fn generate_public_id() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = thread_rng();
    let suffix: String = (0..12).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect();
    format!("cfg-{suffix}")
}

/// Generates a human-shareable quote code.
///
/// Format: `Q-{base36 millisecond timestamp}-{6 random base36 chars}`, matching
/// `^Q-[0-9A-Z]+-[0-9A-Z]{6}$`. The code is the only credential needed to view
/// a quote publicly, so the random suffix keeps codes minted in the same
/// millisecond distinct.
pub fn generate_quote_code() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut rng = thread_rng();
    let suffix: String = (0..6).map(|_| BASE36[rng.gen_range(0..36)] as char).collect();

    format!("Q-{}-{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_public_key_format() {
        let key = generate_public_key();

        // Should start with "pk-"
        assert!(key.starts_with("pk-"));

        // Should be correct length: "pk-" (3) + base64url(32 bytes) (43)
        assert_eq!(key.len(), 46);

        // Should only contain valid base64url characters after prefix
        let key_part = &key[3..];
        assert!(key_part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_generate_public_key_uniqueness() {
        let mut keys = HashSet::new();

        // Generate 1000 keys and ensure they're all unique
        for _ in 0..1000 {
            let key = generate_public_key();
            assert!(keys.insert(key), "Generated duplicate public key");
        }
    }

    #[test]
    fn test_generate_public_id_format() {
        let id = generate_public_id();
        assert!(id.starts_with("cfg-"));
        assert_eq!(id.len(), 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_quote_code_shape() {
        let code = generate_quote_code();
        let parts: Vec<&str> = code.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "Q");
        assert!(!parts[1].is_empty());
        assert!(parts[1].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_quote_codes_unique_in_quick_succession() {
        let mut codes = HashSet::new();
        for _ in 0..10_000 {
            let code = generate_quote_code();
            assert!(codes.insert(code), "Generated duplicate quote code");
        }
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(36 * 36), "100");
    }
}
