// mod.rs - Hashers module root

pub mod crc32;
pub mod md5;
pub mod registry;
pub mod sha256;
pub mod traits;

// Re-export main types for convenience
pub use crc32::Crc32Hasher;
pub use md5::Md5Hasher;
pub use registry::HasherRegistry;
pub use sha256::Sha256Hasher;
pub use traits::{CodeHasher, Fingerprint};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_hasher() {
        let hasher = Crc32Hasher;
        let fp1 = hasher.fingerprint_str("def f(): pass");
        let fp2 = hasher.fingerprint_str("def f(): pass");
        let fp3 = hasher.fingerprint_str("def g(): pass");

        assert_eq!(fp1, fp2);
        assert_ne!(fp1, fp3);
        assert_eq!(hasher.name(), "CRC32");
    }

    #[test]
    fn test_crc32_low_bits_match_plain_crc() {
        let data = b"func main() {}";
        let fp = Crc32Hasher.fingerprint(data);
        assert_eq!(fp as u32, crc32fast::hash(data));
    }

    #[test]
    fn test_sha256_hasher() {
        let hasher = Sha256Hasher;
        // SHA256("abc") = ba7816bf8f01cfea...
        assert_eq!(hasher.fingerprint(b"abc"), 0xba7816bf8f01cfea);
        assert_eq!(hasher.name(), "SHA256");
    }

    #[test]
    fn test_md5_hasher() {
        let hasher = Md5Hasher;
        // MD5("abc") = 900150983cd24fb0...
        assert_eq!(hasher.fingerprint(b"abc"), 0x900150983cd24fb0);
    }

    #[test]
    fn test_keyed_fingerprints_are_independent() {
        let hasher = Crc32Hasher;
        let a = hasher.keyed_fingerprint(42, "partition", "python_1");
        let b = hasher.keyed_fingerprint(42, "sample", "python_1");
        let c = hasher.keyed_fingerprint(43, "partition", "python_1");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unit_interval_range() {
        let hasher = Sha256Hasher;
        for i in 0..1000 {
            let u = hasher.unit_interval(7, "sample", &format!("go_{}", i));
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = HasherRegistry::new();

        assert!(registry.has_hasher("crc32"));
        assert!(registry.has_hasher("sha256"));
        assert!(registry.has_hasher("md5"));
        assert!(!registry.has_hasher("nonexistent"));

        assert_eq!(registry.list_hashers().len(), 3);
        assert_eq!(registry.get_hasher_names(), vec!["crc32", "md5", "sha256"]);

        let owned = registry.take_hasher("md5").unwrap();
        assert_eq!(owned.name(), "MD5");
        assert!(!registry.has_hasher("md5"));
    }
}
