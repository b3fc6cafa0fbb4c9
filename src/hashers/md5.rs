// md5.rs - MD5 hasher implementation

use super::traits::{digest_prefix, CodeHasher, Fingerprint};

/// MD5 hasher - legacy compatibility
#[derive(Debug, Clone)]
pub struct Md5Hasher;

impl CodeHasher for Md5Hasher {
    fn fingerprint(&self, data: &[u8]) -> Fingerprint {
        let digest = md5::compute(data);
        digest_prefix(&digest.0)
    }

    fn name(&self) -> &'static str {
        "MD5"
    }

    fn description(&self) -> &'static str {
        "MD5 digest prefix for legacy compatibility"
    }
}
