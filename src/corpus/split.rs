// split.rs - Train/valid/test split of definitions by code fingerprint

use super::record::{open_text, CodeRecord};
use crate::hashers::{CodeHasher, Fingerprint};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

pub const SPLIT_KEYS: [&str; 3] = ["train", "valid", "test"];

/// Languages of the official CodeSearchNet splits
pub const SPLIT_LANGUAGES: [&str; 6] = ["go", "java", "javascript", "python", "php", "ruby"];

#[derive(Debug, Deserialize)]
struct SplitEntry {
    code: String,
}

/// Records routed to each split
#[derive(Debug, Default)]
pub struct SplitAssignment {
    pub train: Vec<CodeRecord>,
    pub valid: Vec<CodeRecord>,
    pub test: Vec<CodeRecord>,
}

impl SplitAssignment {
    pub fn get(&self, split: &str) -> Option<&[CodeRecord]> {
        match split {
            "train" => Some(&self.train),
            "valid" => Some(&self.valid),
            "test" => Some(&self.test),
            _ => None,
        }
    }
}

/// Official split files of a language: `{root}/{lang}/final/jsonl/{split}/*.jsonl.gz`
pub fn split_files(root: &Path, language: &str, split: &str) -> Result<Vec<PathBuf>, String> {
    let dir = root.join(language).join("final").join("jsonl").join(split);
    let entries = fs::read_dir(&dir)
        .map_err(|e| format!("Failed to list split directory '{}': {}", dir.display(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry in '{}': {}", dir.display(), e))?;
        let path = entry.path();
        let is_split_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with("jsonl.gz"))
            .unwrap_or(false);
        if is_split_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Fingerprints of the `code` field of every entry in the given files
pub fn load_split_fingerprints(
    files: &[PathBuf],
    hasher: &dyn CodeHasher,
) -> Result<HashSet<Fingerprint>, String> {
    let mut fingerprints = HashSet::new();
    for path in files {
        let reader = open_text(path)?;
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                format!("Failed to read line {} of '{}': {}", line_num + 1, path.display(), e)
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: SplitEntry = serde_json::from_str(&line).map_err(|e| {
                format!("Invalid split entry at line {} of '{}': {}", line_num + 1, path.display(), e)
            })?;
            fingerprints.insert(hasher.fingerprint_str(&entry.code));
        }
    }
    Ok(fingerprints)
}

/// Route definitions to splits.
///
/// A definition goes to `valid` (`test`) when its code appears in that
/// split's files, and to `train` only when it appears in neither. The two
/// held-out splits are checked independently.
pub fn assign_splits(
    records: &[CodeRecord],
    valid: &HashSet<Fingerprint>,
    test: &HashSet<Fingerprint>,
    hasher: &dyn CodeHasher,
) -> SplitAssignment {
    let mut assignment = SplitAssignment::default();
    for record in records {
        let fp = hasher.fingerprint_str(&record.code);
        let in_valid = valid.contains(&fp);
        let in_test = test.contains(&fp);
        if in_valid {
            assignment.valid.push(record.clone());
        }
        if in_test {
            assignment.test.push(record.clone());
        }
        if !in_valid && !in_test {
            assignment.train.push(record.clone());
        }
    }
    assignment
}
