// reader.rs - Source block discovery and parsing

use super::record::{CodeRecord, RECORD_DELIMITER};
use std::fs;
use std::path::{Path, PathBuf};

/// Parsed contents of one block file
#[derive(Debug, Default)]
pub struct BlockContents {
    pub records: Vec<CodeRecord>,
    pub skipped: usize,
}

/// All `*.txt` files of a source directory, sorted by name
pub fn list_block_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("Failed to list source directory '{}': {}", dir.display(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry in '{}': {}", dir.display(), e))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse every record of a block file
pub fn read_block_file(path: &Path) -> Result<BlockContents, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read block '{}': {}", path.display(), e))?;

    let mut block = BlockContents::default();
    for raw in content.split(RECORD_DELIMITER) {
        if raw.trim().is_empty() {
            continue;
        }
        match CodeRecord::parse_block_record(raw) {
            Some(record) => block.records.push(record),
            None => block.skipped += 1,
        }
    }
    Ok(block)
}

/// Total size of the given files in bytes
pub fn total_bytes(files: &[PathBuf]) -> Result<u64, String> {
    let mut total = 0;
    for path in files {
        let meta = fs::metadata(path)
            .map_err(|e| format!("Failed to stat '{}': {}", path.display(), e))?;
        total += meta.len();
    }
    Ok(total)
}

/// Fingerprint of the input set (file names and sizes)
pub fn input_fingerprint(files: &[PathBuf]) -> Result<u32, String> {
    let mut hasher = crc32fast::Hasher::new();
    for path in files {
        let meta = fs::metadata(path)
            .map_err(|e| format!("Failed to stat '{}': {}", path.display(), e))?;
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        hasher.update(name.as_bytes());
        hasher.update(&meta.len().to_le_bytes());
    }
    Ok(hasher.finalize())
}
