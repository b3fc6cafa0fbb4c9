// mod.rs - Core logic module

pub mod document;
pub mod masking;
pub mod pairs;
pub mod pipeline;
pub mod schedule;
pub mod truncate;

// Re-export main types for convenience
pub use document::{to_code_pairs, CodePair, Document, Sentence};
pub use masking::{create_masked_lm_predictions, MaskedLm};
pub use pairs::{create_pairs_from_document, PairConfig, PairInstance};
pub use pipeline::{IdFilter, Partitioning, Pipeline, PipelineConfig, PipelineSummary};
pub use schedule::{Schedule, WorldInfo};
pub use truncate::{truncate_seq, truncate_seq_pair, TruncationMode};
