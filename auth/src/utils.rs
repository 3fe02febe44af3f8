//! Input normalisation for account fields.

/// Canonical form of an email address: trimmed and lower-cased.
///
/// # Examples
///
/// ```
/// use pharmacy_auth::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Admin@Pharmacy.Example "), "admin@pharmacy.example");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email address format.
///
/// Basic structural check, not full RFC 5322:
/// - exactly one `@` with a non-empty local part
/// - a dotted domain with no empty labels
/// - 3 to 255 characters overall
///
/// # Examples
///
/// ```
/// use pharmacy_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("clerk@pharmacy.example"));
/// assert!(is_valid_email("night.shift+2@branch.pharmacy.example"));
/// assert!(!is_valid_email("clerk"));
/// assert!(!is_valid_email("@pharmacy.example"));
/// assert!(!is_valid_email("clerk@pharmacy"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if !(3..=255).contains(&email.len()) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let local_ok = local
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'));
    let labels: Vec<&str> = domain.split('.').collect();
    let domain_ok = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        });

    local_ok && domain_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("sales_1@pharmacy.example"));
        assert!(is_valid_email("first-last@sub.pharmacy.example"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@@pharmacy.example"));
        assert!(!is_valid_email("user@.example"));
        assert!(!is_valid_email("user@pharmacy..example"));
        assert!(!is_valid_email("user name@pharmacy.example"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("Clerk@Example.COM"), "clerk@example.com");
    }
}
