//! Syntactic email address validation.
//!
//! No DNS or mailbox verification; the delivery attempt is the real test.
//! Invalid addresses are reported in the logs only, never to the caller.

use tracing::{info, warn};

/// Check whether an address is syntactically plausible: exactly one `@`
/// separating non-empty local and domain parts, with a `.` in the domain.
pub fn is_valid(address: &str) -> bool {
    if address.is_empty() {
        return false;
    }

    let parts: Vec<&str> = address.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || domain.is_empty() {
        return false;
    }

    domain.contains('.')
}

/// Partition addresses into valid and invalid, preserving input order
/// within each partition. Invalid entries are logged and dropped from
/// downstream processing.
pub fn filter_valid(addresses: &[String]) -> (Vec<String>, Vec<String>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for address in addresses {
        if is_valid(address) {
            valid.push(address.clone());
        } else {
            warn!(address = %address, "Ignoring invalid email address");
            invalid.push(address.clone());
        }
    }

    if !invalid.is_empty() {
        info!(count = invalid.len(), "Dropped invalid email addresses");
    }

    (valid, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_simple_addresses() {
        assert!(is_valid("user@domain.tld"));
        assert!(is_valid("first.last@sub.domain.org"));
        assert!(is_valid("u@d.co"));
    }

    #[test]
    fn test_rejects_missing_at() {
        assert!(!is_valid(""));
        assert!(!is_valid("nodomain"));
        assert!(!is_valid("user.domain.com"));
    }

    #[test]
    fn test_rejects_empty_local_or_domain() {
        assert!(!is_valid("@domain.com"));
        assert!(!is_valid("user@"));
        assert!(!is_valid("@"));
    }

    #[test]
    fn test_rejects_multiple_at_signs() {
        assert!(!is_valid("user@@domain.com"));
        assert!(!is_valid("a@b@c.com"));
    }

    #[test]
    fn test_rejects_domain_without_dot() {
        assert!(!is_valid("user@localhost"));
        assert!(!is_valid("user@domain"));
    }

    #[test]
    fn test_filter_preserves_order() {
        let input = vec![
            "a@b.com".to_string(),
            "bad".to_string(),
            "c@d.org".to_string(),
        ];
        let (valid, invalid) = filter_valid(&input);

        assert_eq!(valid, vec!["a@b.com".to_string(), "c@d.org".to_string()]);
        assert_eq!(invalid, vec!["bad".to_string()]);
    }

    #[test]
    fn test_filter_empty_input() {
        let (valid, invalid) = filter_valid(&[]);
        assert!(valid.is_empty());
        assert!(invalid.is_empty());
    }
}
