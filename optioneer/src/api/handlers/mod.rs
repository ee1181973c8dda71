//! Axum route handlers.

pub mod auth;
pub mod billing;
pub mod categories;
pub mod configurators;
pub mod embed;
pub mod options;
pub mod quotes;
pub mod themes;

/// Syntactic email check: local part, one `@`, dotted domain. Deliverability
/// is not verified here; the confirmation email is the real probe.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || email.contains(' ') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        for email in ["a@b.co", "customer@shop.example.com", "first.last+tag@sub.domain.io"] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["", "plain", "@no-local.com", "no-domain@", "no-tld@host", "two words@x.com", "a@.com", "a@b."] {
            assert!(!is_valid_email(email), "{email} should be invalid");
        }
    }
}
