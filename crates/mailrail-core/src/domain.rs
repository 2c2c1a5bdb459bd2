//! Domain-name parsing utilities

/// Split a fully-qualified domain into `(subdomain, apex)`.
///
/// The rightmost two labels form the apex; anything left of them is the
/// subdomain. A bare apex yields `None` for the subdomain.
///
/// Public-suffix handling (e.g. `co.uk`) is intentionally out of scope.
pub fn split_domain(domain: &str) -> (Option<String>, String) {
    let labels: Vec<&str> = domain.split('.').collect();

    if labels.len() < 3 {
        return (None, domain.to_string());
    }

    let split_at = labels.len() - 2;
    (
        Some(labels[..split_at].join(".")),
        labels[split_at..].join("."),
    )
}

/// Split an email address into `(local_part, domain)`.
pub fn parse_email(email: &str) -> Option<(String, String)> {
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some((local.to_string(), domain.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_domain_with_subdomain() {
        let (sub, apex) = split_domain("demo.example.com");
        assert_eq!(sub.as_deref(), Some("demo"));
        assert_eq!(apex, "example.com");
    }

    #[test]
    fn test_split_domain_with_nested_subdomain() {
        let (sub, apex) = split_domain("mail.demo.example.com");
        assert_eq!(sub.as_deref(), Some("mail.demo"));
        assert_eq!(apex, "example.com");
    }

    #[test]
    fn test_split_domain_apex_only() {
        let (sub, apex) = split_domain("example.com");
        assert_eq!(sub, None);
        assert_eq!(apex, "example.com");
    }

    #[test]
    fn test_split_domain_single_label() {
        let (sub, apex) = split_domain("localhost");
        assert_eq!(sub, None);
        assert_eq!(apex, "localhost");
    }

    #[test]
    fn test_parse_email() {
        let (local, domain) = parse_email("alice@demo.example.com").unwrap();
        assert_eq!(local, "alice");
        assert_eq!(domain, "demo.example.com");
    }

    #[test]
    fn test_parse_email_invalid() {
        assert!(parse_email("not-an-email").is_none());
        assert!(parse_email("@example.com").is_none());
        assert!(parse_email("alice@").is_none());
    }
}
