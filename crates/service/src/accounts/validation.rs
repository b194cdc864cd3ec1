//! Address syntax checks for domains, usernames and aliases.
//!
//! Names validated here become directory names under the store root, so the accepted
//! alphabet is the RFC 5322 dot-atom set minus `/`. A dot-atom can never start with `.`
//! or contain `..`, which keeps every accepted name a plain, non-hidden path component.

use crate::errors::AccountError;

const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~".contains(c)
}

fn is_dot_atom(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}

fn is_valid_domain(domain: &str) -> bool {
    domain.len() <= MAX_DOMAIN_LEN && !domain.is_empty() && domain.split('.').all(is_dns_label)
}

fn is_valid_local(local: &str) -> bool {
    local.len() <= MAX_LOCAL_LEN && is_dot_atom(local)
}

/// A domain is valid when some local part joined with `@` and the name forms a valid address.
pub fn validate_domain(name: &str) -> Result<(), AccountError> {
    if is_valid_domain(name) {
        Ok(())
    } else {
        Err(AccountError::InvalidName(format!("{name:?} is not a usable mail domain")))
    }
}

/// Checks that `username@domain` is a valid address.
pub fn validate_address(username: &str, domain: &str) -> Result<(), AccountError> {
    validate_domain(domain)?;
    if is_valid_local(username) {
        Ok(())
    } else {
        Err(AccountError::InvalidName(format!("{username:?}@{domain} is not a valid address")))
    }
}

/// Split `local@domain` into its parts after validating both.
pub fn parse_address(address: &str) -> Result<(&str, &str), AccountError> {
    let (local, domain) = address
        .rsplit_once('@')
        .ok_or_else(|| AccountError::InvalidName(format!("{address:?} is missing '@'")))?;
    validate_address(local, domain)?;
    Ok((local, domain))
}

/// Normalize an alias given either as a bare local part or as a full address in `domain`.
pub fn normalize_alias(alias: &str, domain: &str) -> Result<String, AccountError> {
    let alias = alias.trim();
    if alias.contains('@') {
        let (local, alias_domain) = parse_address(alias)?;
        if !alias_domain.eq_ignore_ascii_case(domain) {
            return Err(AccountError::InvalidName(format!("alias {alias} must belong to domain {domain}")));
        }
        Ok(format!("{local}@{domain}"))
    } else {
        validate_address(alias, domain)?;
        Ok(format!("{alias}@{domain}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_domains() {
        for d in ["example.com", "mail.example.co.uk", "localhost", "xn--bcher-kva.example", "a-b.io"] {
            assert!(validate_domain(d).is_ok(), "{d}");
        }
    }

    #[test]
    fn rejects_unsafe_or_malformed_domains() {
        for d in ["", ".", "..", "example..com", ".example.com", "example.com.", "-a.com", "a-.com", "a/b.com", "a b.com", "a@b.com"] {
            assert!(matches!(validate_domain(d), Err(AccountError::InvalidName(_))), "{d}");
        }
        let long_label = format!("{}.com", "a".repeat(64));
        assert!(validate_domain(&long_label).is_err());
    }

    #[test]
    fn validates_local_parts() {
        assert!(validate_address("alice", "example.com").is_ok());
        assert!(validate_address("first.last+tag", "example.com").is_ok());
        for u in ["", ".alice", "alice.", "al..ice", "a/b", "a b", "a\\b", "..", "a@b"] {
            assert!(validate_address(u, "example.com").is_err(), "{u}");
        }
        assert!(validate_address(&"x".repeat(65), "example.com").is_err());
    }

    #[test]
    fn parses_addresses() -> Result<(), AccountError> {
        assert_eq!(parse_address("bob@example.com")?, ("bob", "example.com"));
        assert!(parse_address("bob").is_err());
        assert!(parse_address("@example.com").is_err());
        Ok(())
    }

    #[test]
    fn normalizes_aliases() -> Result<(), AccountError> {
        assert_eq!(normalize_alias("sales", "example.com")?, "sales@example.com");
        assert_eq!(normalize_alias("sales@EXAMPLE.com", "example.com")?, "sales@example.com");
        assert!(normalize_alias("sales@other.com", "example.com").is_err());
        assert!(normalize_alias("sa les", "example.com").is_err());
        Ok(())
    }
}
