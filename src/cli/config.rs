// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub code: Option<String>,
    pub sink: Option<String>,
    pub output_format: Option<String>,
    pub vocab_file: Option<String>,

    // Scheduling
    pub schedule: Option<String>,
    pub local_n_workers: Option<usize>,
    pub local_threads_per_worker: Option<usize>,
    pub threads: Option<usize>,

    // Partitioning and sampling
    pub block_size: Option<String>,
    pub num_blocks: Option<usize>,
    pub sample_ratio: Option<f64>,
    pub seed: Option<u64>,
    pub hasher_type: Option<String>,
    pub include_ids: Option<String>,
    pub exclude_ids: Option<String>,

    // Instances
    pub target_seq_length: Option<usize>,
    pub short_seq_prob: Option<f64>,
    pub bin_size: Option<usize>,
    pub duplicate_factor: Option<usize>,
    pub masking: Option<bool>,
    pub masked_lm_ratio: Option<f64>,
    pub truncation: Option<String>,

    // Cache
    pub cache_dir: Option<String>,
    pub force_recompute: Option<bool>,

    // Flags
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# codebert-prep.toml - Configuration file for preprocess_codebert_pretrain
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Directory of source block files (block_*.txt from shard_codebert_data)
code = "/workspace/codebert/source"

# Output directory for the preprocessed partitions
sink = "/workspace/codebert/pretrain/parquet"

# Output format: parquet, txt
output_format = "parquet"

# vocab.txt, tokenizer.json, or a directory holding either
vocab_file = "codebert_tokenizer/vocab.txt"

# =============================================================================
# SCHEDULING
# =============================================================================

# How ranks are launched: mpi, local
schedule = "mpi"

# Local schedule only
# local_n_workers = 16
# local_threads_per_worker = 1

# Number of threads per process (omit for auto-detection)
# threads = 4

# =============================================================================
# PARTITIONING AND SAMPLING
# =============================================================================

# Number of partitions (exclusive with block_size)
num_blocks = 4096

# Approximate input bytes per partition (exclusive with num_blocks)
# block_size = "256M"

# Fraction of records kept
sample_ratio = 0.9

# Random seed
seed = 42

# Record hasher for sampling and partitioning: crc32, sha256, md5
hasher_type = "crc32"

# Record id filters (regex)
# include_ids = "^(python|java)_"
# exclude_ids = "_0$"

# =============================================================================
# INSTANCES
# =============================================================================

# Maximum sequence length
target_seq_length = 128

# Probability of using only the first docstring segment
short_seq_prob = 0.1

# Sequence-length bin width (must divide target_seq_length)
bin_size = 32

# Number of instance-creation passes
duplicate_factor = 1

# Static masking
masking = false
masked_lm_ratio = 0.15

# Truncation of over-long sequences: random, tail
truncation = "random"

# =============================================================================
# CACHE
# =============================================================================

# Tokenized partition cache
# cache_dir = "/workspace/codebert/token_cache"

# Ignore existing caches
force_recompute = false

# =============================================================================
# FLAGS
# =============================================================================

# Validate inputs without writing output
dry_run = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.num_blocks, Some(4096));
        assert_eq!(config.bin_size, Some(32));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.block_size, None);
        assert_eq!(config.truncation.as_deref(), Some("random"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prep.toml");
        let config = Config {
            sink: Some("/out".to_string()),
            sample_ratio: Some(0.5),
            ..Config::new()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.sink.as_deref(), Some("/out"));
        assert_eq!(loaded.sample_ratio, Some(0.5));
        assert!(loaded.code.is_none());
    }

    #[test]
    fn test_unknown_file_is_an_error() {
        assert!(Config::from_file("/nonexistent/prep.toml").is_err());
    }
}
