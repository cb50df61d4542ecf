//! Body digests for stored responses.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a response body.
pub fn body_digest(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_stability() {
        assert_eq!(body_digest(b"<html></html>"), body_digest(b"<html></html>"));
    }

    #[test]
    fn test_digest_differs() {
        assert_ne!(body_digest(b"body { color: red }"), body_digest(b"body { color: blue }"));
    }

    #[test]
    fn test_digest_empty() {
        assert_eq!(
            body_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_format() {
        let digest = body_digest(b"x");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
