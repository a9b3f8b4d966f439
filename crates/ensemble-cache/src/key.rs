//! Exact-match cache key derivation.

use sha2::{Digest, Sha256};

/// Computes the exact-match cache key for `(prompt, user_id, tier)`.
///
/// `"ensemble:" || sha256(prompt "|" user_id "|" tier)[:32]`.
pub fn exact_key(prompt: &str, user_id: &str, tier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(b"|");
    hasher.update(user_id.as_bytes());
    hasher.update(b"|");
    hasher.update(tier.as_bytes());
    let digest = hasher.finalize();
    let hex = format!("{:x}", digest);
    format!("ensemble:{}", &hex[..32])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_same_key() {
        assert_eq!(exact_key("hello", "u1", "free"), exact_key("hello", "u1", "free"));
    }

    #[test]
    fn different_inputs_produce_different_keys() {
        assert_ne!(exact_key("hello", "u1", "free"), exact_key("hello", "u2", "free"));
        assert_ne!(exact_key("hello", "u1", "free"), exact_key("hello", "u1", "pro"));
    }

    #[test]
    fn key_has_expected_shape() {
        let key = exact_key("hello", "u1", "free");
        assert!(key.starts_with("ensemble:"));
        assert_eq!(key.len(), "ensemble:".len() + 32);
    }
}
