//! Versioned content hashing.
//!
//! The hash is the optimistic-concurrency token of the apply path: a diff
//! carries the hash of the snapshot it was computed against, and applying it
//! is only unconditionally safe while the live snapshot still hashes to the
//! same value.

use sha2::{Digest, Sha256};

use crate::snapshot::Snapshot;

/// Compute the SHA-256 fingerprint of a snapshot.
///
/// The input is the compact JSON document of the snapshot. Metadata object
/// keys are emitted in sorted order and entity sequences in stored order, so
/// equal content in the same order always hashes the same and any reordering
/// of an entity sequence changes the hash.
pub fn versioned_hash(snapshot: &Snapshot) -> String {
    compute_checksum(&snapshot.to_document().to_string())
}

/// Compute a SHA-256 checksum of the content.
fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Collection, Field};
    use serde_json::json;

    fn sample() -> Snapshot {
        Snapshot::new("1.0.0")
            .with_collection(Collection::new("articles").with_meta(json!({ "icon": "article", "hidden": false })))
            .with_collection(Collection::new("users"))
            .with_field(Field::new("articles", "title", "string"))
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = versioned_hash(&sample());
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(versioned_hash(&sample()), versioned_hash(&sample().clone()));
    }

    #[test]
    fn test_hash_ignores_meta_key_order() {
        let a = Snapshot::new("1.0.0")
            .with_collection(Collection::new("a").with_meta(json!({ "x": 1, "y": 2 })));
        let b = Snapshot::new("1.0.0")
            .with_collection(Collection::new("a").with_meta(json!({ "y": 2, "x": 1 })));
        assert_eq!(versioned_hash(&a), versioned_hash(&b));
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let mut reordered = sample();
        reordered.collections.reverse();
        assert_ne!(versioned_hash(&sample()), versioned_hash(&reordered));
    }

    #[test]
    fn test_hash_covers_content_and_platform() {
        let mut edited = sample();
        edited.fields[0].field_type = "text".to_string();
        assert_ne!(versioned_hash(&sample()), versioned_hash(&edited));

        let mut upgraded = sample();
        upgraded.platform = "1.1.0".to_string();
        assert_ne!(versioned_hash(&sample()), versioned_hash(&upgraded));
    }
}
