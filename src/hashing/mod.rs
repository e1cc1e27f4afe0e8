//! BLAKE3 helpers for index fingerprints and feature hashing.

use blake3::Hasher;

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for feature hashing in [`HashEmbedder`](crate::embedding::HashEmbedder), where a rare
/// collision only merges two tokens into one bucket.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Hashes a normalized token (see [`hash_to_u64`]).
#[inline]
pub fn hash_token(token: &str) -> u64 {
    hash_to_u64(token.as_bytes())
}

/// Incremental fingerprint over index contents.
///
/// Every field is length-prefixed so that `("ab", "c")` and `("a", "bc")` hash differently.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinter {
    hasher: Hasher,
    records: u64,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one record into the fingerprint.
    pub fn update_record(&mut self, id: &str, source: &str, text: &str, embedding: &[f32]) {
        self.update_field(id.as_bytes());
        self.update_field(source.as_bytes());
        self.update_field(text.as_bytes());
        self.hasher.update(&(embedding.len() as u64).to_le_bytes());
        for value in embedding {
            self.hasher.update(&value.to_le_bytes());
        }
        self.records += 1;
    }

    fn update_field(&mut self, bytes: &[u8]) {
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// Returns the full 32-byte digest.
    pub fn finalize(&self) -> [u8; 32] {
        let mut hasher = self.hasher.clone();
        hasher.update(&self.records.to_le_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Returns a short hex form (16 chars) suitable for report metadata.
    pub fn finalize_short_hex(&self) -> String {
        self.finalize()[..8]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hash_to_u64_determinism() {
        let data = b"operator must record lot number";

        let hash1 = hash_to_u64(data);
        let hash2 = hash_to_u64(data);

        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_token_uniqueness() {
        let tokens = ["record", "records", "Record", "lot", "number"];

        let hashes: HashSet<_> = tokens.iter().map(|t| hash_token(t)).collect();

        assert_eq!(hashes.len(), tokens.len());
    }

    #[test]
    fn test_fingerprint_determinism() {
        let mut a = Fingerprinter::new();
        a.update_record("R1", "gmp.txt", "Record lot numbers.", &[0.1, 0.2]);
        let mut b = Fingerprinter::new();
        b.update_record("R1", "gmp.txt", "Record lot numbers.", &[0.1, 0.2]);

        assert_eq!(a.finalize(), b.finalize());
        assert_eq!(a.finalize_short_hex().len(), 16);
    }

    #[test]
    fn test_fingerprint_field_boundaries() {
        let mut a = Fingerprinter::new();
        a.update_record("ab", "c", "text", &[1.0]);
        let mut b = Fingerprinter::new();
        b.update_record("a", "bc", "text", &[1.0]);

        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_fingerprint_embedding_sensitivity() {
        let mut a = Fingerprinter::new();
        a.update_record("R1", "doc", "text", &[1.0, 0.0]);
        let mut b = Fingerprinter::new();
        b.update_record("R1", "doc", "text", &[1.0, 0.000_1]);

        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_empty_fingerprint_is_stable() {
        assert_eq!(
            Fingerprinter::new().finalize(),
            Fingerprinter::default().finalize()
        );
    }
}
