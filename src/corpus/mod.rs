// mod.rs - Raw corpus handling: extraction, split, sharding, block reading

pub mod extract;
pub mod reader;
pub mod record;
pub mod shard;
pub mod split;

// Re-export main types for convenience
pub use extract::{extract_languages, LanguageStats, DEFAULT_LANGUAGES};
pub use reader::{list_block_files, read_block_file, BlockContents};
pub use record::{read_jsonl_records, write_jsonl_records, CodeRecord};
pub use shard::write_blocks;
pub use split::{assign_splits, SplitAssignment, SPLIT_KEYS, SPLIT_LANGUAGES};
