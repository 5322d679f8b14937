//! Content fingerprints used as storage idempotency keys.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest, 64 characters.
pub type Fingerprint = String;

/// Hash `content` followed by `source`.
///
/// The two parts are concatenated without a separator so that keys match
/// documents already stored under the same scheme.
pub fn fingerprint(content: &str, source: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            fingerprint("test ", "data"),
            "916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f9"
        );
    }

    #[test]
    fn test_stable_and_fixed_length() {
        let a = fingerprint("alice@example.com:hunter2", "combo.txt");
        let b = fingerprint("alice@example.com:hunter2", "combo.txt");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_source_changes_key() {
        assert_ne!(
            fingerprint("bob 1234", "a.csv"),
            fingerprint("bob 1234", "b.csv")
        );
    }
}
