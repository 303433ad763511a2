//! Recipient module.
//!
//! This module contains helpers around raw recipient cells.

use regex::Regex;

/// Extracts the first syntactically valid email address from the given
/// raw cell value. Returns `None` when the cell holds no address, which
/// callers treat as a row to skip, never as an error.
pub fn extract_addr<V: AsRef<str>>(value: V) -> Option<String> {
    Regex::new(r"[\w.-]+@[\w.-]+\.\w+")
        .unwrap()
        .find(value.as_ref())
        .map(|addr| addr.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_bare_address() {
        assert_eq!(
            Some("alice@localhost.io".into()),
            extract_addr("alice@localhost.io")
        );
    }

    #[test]
    fn test_extracts_address_embedded_in_text() {
        assert_eq!(
            Some("alice@localhost.io".into()),
            extract_addr("Alice Smith <alice@localhost.io>")
        );
        assert_eq!(
            Some("bob@mail.example.org".into()),
            extract_addr("reach bob@mail.example.org (work)")
        );
    }

    #[test]
    fn test_extracts_first_of_several() {
        assert_eq!(
            Some("a@x.io".into()),
            extract_addr("a@x.io, b@y.io")
        );
    }

    #[test]
    fn test_no_address_yields_none() {
        assert_eq!(None, extract_addr(""));
        assert_eq!(None, extract_addr("not-an-email"));
        assert_eq!(None, extract_addr("alice@localhost"));
        assert_eq!(None, extract_addr("@mail.io"));
    }
}
