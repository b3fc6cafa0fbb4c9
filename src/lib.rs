// lib.rs - codebert-prep library root

//! # codebert-prep - CodeBERT pretraining data preparation
//!
//! Turns CodeSearchNet-style function dumps into pretraining instances of the
//! form `[CLS] docstring [SEP] code [SEP]`, written as parquet partitions that
//! can be binned by sequence length and rebalanced into equal-sized shards.
//!
//! ## Features
//!
//! - **Raw corpus tools**: extraction, deduplicated train/valid/test split, seeded block sharding
//! - **Distributed preprocessing**: `mpirun` ranks own disjoint partitions, rayon inside each rank
//! - **Deterministic output**: per-partition RNGs make results independent of scheduling
//! - **Static masking**: optional masked LM positions and labels stored with each instance
//! - **Token cache**: LZ4-compressed tokenized partitions reused across runs
//! - **Shard balancing**: near-equal row counts per shard and bin
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use codebert_prep::prelude::*;
//!
//! let tokenizer = HfTokenizer::from_path(std::path::Path::new("codebert_tokenizer/vocab.txt"))?;
//! let registry = HasherRegistry::new();
//! let hasher = registry.get_hasher("crc32").ok_or("missing hasher")?;
//!
//! let config = PipelineConfig {
//!     source: "source".into(),
//!     sink: "pretrain".into(),
//!     output_format: OutputFormat::Parquet,
//!     pairs: PairConfig::default(),
//!     bins: Some(BinSpec::new(32, 128)?),
//!     partitioning: Partitioning::NumBlocks(64),
//!     sample_ratio: 0.9,
//!     seed: 12345,
//!     duplicate_factor: 1,
//!     id_filter: IdFilter::default(),
//!     cache_dir: None,
//!     force_recompute: false,
//! };
//! let summary = Pipeline::new(config, &tokenizer, hasher, WorldInfo::single()).run()?;
//! println!("{} instances", summary.instances);
//! # Ok::<(), String>(())
//! ```

// Re-export all main modules
pub mod balance;
pub mod cli;
pub mod core;
pub mod corpus;
pub mod hashers;
pub mod launch;
pub mod output;
pub mod tokenize;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::balance::{balance, BalanceConfig, GroupSummary};
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{CodePair, PairConfig, PairInstance, TruncationMode};
    pub use crate::core::{IdFilter, Partitioning, Pipeline, PipelineConfig, PipelineSummary};
    pub use crate::core::{Schedule, WorldInfo};
    pub use crate::corpus::CodeRecord;
    pub use crate::hashers::{CodeHasher, Crc32Hasher, HasherRegistry, Md5Hasher, Sha256Hasher};
    pub use crate::output::{BinSpec, OutputFormat};
    pub use crate::tokenize::{HfTokenizer, SubwordTokenizer, TokenCache};
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use core::{Pipeline, PipelineConfig, PipelineSummary};
pub use hashers::{CodeHasher, HasherRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
