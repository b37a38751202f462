//! Identifier masking for logs and notifications.
//!
//! Secrets are never surfaced anywhere; account identifiers only appear in
//! a masked form. Malformed identifiers pass through unchanged rather than
//! erroring, so a bad account entry can still be reported on.

/// Mask an email-shaped identifier. `john.doe@example.com` becomes
/// `j***e@e***e.com`. Anything that does not look like `local@domain`
/// is returned as-is.
pub fn mask_identifier(identifier: &str) -> String {
    let mut parts = identifier.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
            format!("{}@{}", mask_part(local), mask_domain(domain))
        }
        _ => identifier.to_string(),
    }
}

fn mask_part(part: &str) -> String {
    let chars: Vec<char> = part.chars().collect();
    if chars.len() <= 2 {
        format!("{}***", chars[0])
    } else {
        format!("{}***{}", chars[0], chars[chars.len() - 1])
    }
}

fn mask_domain(domain: &str) -> String {
    match domain.rsplit_once('.') {
        Some((name, tld)) if !name.is_empty() => format!("{}.{}", mask_part(name), tld),
        _ => domain.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_full_address() {
        assert_eq!(mask_identifier("john.doe@example.com"), "j***e@e***e.com");
    }

    #[test]
    fn test_mask_short_local_part() {
        assert_eq!(mask_identifier("ab@example.com"), "a***@e***e.com");
        assert_eq!(mask_identifier("a@example.com"), "a***@e***e.com");
    }

    #[test]
    fn test_mask_dotless_domain() {
        assert_eq!(mask_identifier("user@localhost"), "u***r@localhost");
    }

    #[test]
    fn test_mask_multi_dot_domain_keeps_tld() {
        assert_eq!(mask_identifier("user@mail.example.com"), "u***r@m***e.com");
    }

    #[test]
    fn test_malformed_passes_through() {
        assert_eq!(mask_identifier("no-at-sign"), "no-at-sign");
        assert_eq!(mask_identifier(""), "");
        assert_eq!(mask_identifier("@example.com"), "@example.com");
        assert_eq!(mask_identifier("user@"), "user@");
        assert_eq!(mask_identifier("a@b@c"), "a@b@c");
    }

    #[test]
    fn test_mask_preserves_separator_and_hides_local() {
        let masked = mask_identifier("secretuser@example.com");
        assert!(masked.contains('@'));
        assert!(!masked.contains("secretuser"));
    }
}
