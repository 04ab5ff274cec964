//! SHA-256 checksum utility for manifest change detection.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 checksum of a string as lowercase hex
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable_hex() {
        let a = compute_checksum("catalog.schema");
        assert_eq!(a, compute_checksum("catalog.schema"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, compute_checksum("catalog.other"));
    }
}
