// mod.rs - Tokenization module

pub mod cache;
pub mod tokenizer;

// Re-export main types for convenience
pub use cache::{CacheSettings, CacheState, TokenCache};
pub use tokenizer::{HfTokenizer, SubwordTokenizer, DEFAULT_VOCAB_PATH};
