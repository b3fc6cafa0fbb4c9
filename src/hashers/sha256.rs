// sha256.rs - SHA256 hasher implementation

use super::traits::{digest_prefix, CodeHasher, Fingerprint};

/// SHA256 hasher - cryptographically secure alternative
#[derive(Debug, Clone)]
pub struct Sha256Hasher;

impl CodeHasher for Sha256Hasher {
    fn fingerprint(&self, data: &[u8]) -> Fingerprint {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(data);
        digest_prefix(&hasher.finalize())
    }

    fn name(&self) -> &'static str {
        "SHA256"
    }

    fn description(&self) -> &'static str {
        "SHA256 digest prefix, best distribution"
    }
}
