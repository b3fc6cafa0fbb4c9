// crc32.rs - CRC32 hasher implementation

use super::traits::{CodeHasher, Fingerprint};

/// CRC32 hasher - fast default
///
/// The 32-bit checksum is spread over 64 bits by running a second pass
/// over the data with the first checksum as the initial state.
#[derive(Debug, Clone)]
pub struct Crc32Hasher;

impl CodeHasher for Crc32Hasher {
    fn fingerprint(&self, data: &[u8]) -> Fingerprint {
        use crc32fast::Hasher;
        let mut hasher = Hasher::new();
        hasher.update(data);
        let low = hasher.finalize();

        let mut hasher = Hasher::new_with_initial(low ^ 0x9E37_79B9);
        hasher.update(data);
        let high = hasher.finalize();

        ((high as u64) << 32) | low as u64
    }

    fn name(&self) -> &'static str {
        "CRC32"
    }

    fn description(&self) -> &'static str {
        "Double-pass CRC32, fastest option"
    }
}
