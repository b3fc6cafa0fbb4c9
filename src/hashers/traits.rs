// traits.rs - Core traits and types for the fingerprint hasher system

use std::fmt::Debug;

/// A 64-bit fingerprint of a byte string
pub type Fingerprint = u64;

/// Trait for record fingerprinting strategies
/// Fingerprints drive deduplication against split files, partition
/// assignment and sampling decisions, so they must be stable across runs
/// and across machines.
pub trait CodeHasher: Send + Sync + Debug {
    /// Compute the fingerprint of raw bytes
    fn fingerprint(&self, data: &[u8]) -> Fingerprint;

    /// Get a human-readable name for this hasher
    fn name(&self) -> &'static str;

    /// Get a description of this hasher
    fn description(&self) -> &'static str;

    /// Fingerprint a string
    fn fingerprint_str(&self, text: &str) -> Fingerprint {
        self.fingerprint(text.as_bytes())
    }

    /// Fingerprint a record id under a seed and a purpose tag, so that the
    /// same id yields independent values for independent decisions
    fn keyed_fingerprint(&self, seed: u64, tag: &str, id: &str) -> Fingerprint {
        let mut buf = Vec::with_capacity(8 + tag.len() + id.len());
        buf.extend_from_slice(&seed.to_le_bytes());
        buf.extend_from_slice(tag.as_bytes());
        buf.extend_from_slice(id.as_bytes());
        self.fingerprint(&buf)
    }

    /// Map a keyed fingerprint to [0, 1)
    fn unit_interval(&self, seed: u64, tag: &str, id: &str) -> f64 {
        let fp = self.keyed_fingerprint(seed, tag, id);
        (fp >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Fold the first eight bytes of a digest into a fingerprint
pub(crate) fn digest_prefix(digest: &[u8]) -> Fingerprint {
    let mut bytes = [0u8; 8];
    let n = digest.len().min(8);
    bytes[..n].copy_from_slice(&digest[..n]);
    u64::from_be_bytes(bytes)
}
