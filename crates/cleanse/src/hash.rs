use sha2::{Digest, Sha256};

/// Hash cleaned bytes together with the cleaning version.
///
/// The version is folded in as a prefix (`version || 0x00 || bytes`) so the
/// same text cleaned under different rules never hashes identically.
pub fn hash_cleaned_bytes(version: u32, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(version.to_be_bytes());
    hasher.update([0u8]);
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Convenience wrapper over [`hash_cleaned_bytes`] for version-1 text.
pub fn hash_text(text: &str) -> String {
    hash_cleaned_bytes(1, text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        for text in ["", "hello world", "こんにちは世界"] {
            assert_eq!(hash_text(text), hash_text(text));
        }
    }

    #[test]
    fn hash_depends_on_version() {
        let text = b"same bytes";
        assert_ne!(hash_cleaned_bytes(1, text), hash_cleaned_bytes(2, text));
    }

    #[test]
    fn hash_is_hex_encoded_sha256() {
        let digest = hash_text("anything");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
