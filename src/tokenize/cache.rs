// cache.rs - Tokenized partition cache (bincode + LZ4)

use crate::core::document::CodePair;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Bumped whenever the on-disk layout changes
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Everything that decides which documents land in a partition and how they are tokenized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    pub vocab_fingerprint: u32,
    pub hasher_type: String,
    pub seed: u64,
    pub sample_ratio: f64,
    pub num_partitions: usize,
    pub input_fingerprint: u32,
    pub id_filters: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub format_version: u32,
    pub version: String,
    pub created: String,
    pub partition: usize,
    pub num_documents: usize,
    pub settings: CacheSettings,
}

/// What the sidecar of one partition says about reuse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Missing,
    Ready,
    /// Present but unusable, with the reason
    Stale(String),
}

/// One LZ4 blob plus a JSON metadata sidecar per partition
pub struct TokenCache {
    dir: PathBuf,
    settings: CacheSettings,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>, settings: CacheSettings) -> Result<Self, String> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create cache directory '{}': {}", dir.display(), e))?;
        Ok(Self { dir, settings })
    }

    pub fn path(&self, partition: usize) -> PathBuf {
        self.dir.join(format!("partition-{:05}.tok.lz4", partition))
    }

    pub fn metadata_path(&self, partition: usize) -> PathBuf {
        self.dir.join(format!("partition-{:05}.meta.json", partition))
    }

    /// Explain why cached metadata cannot be reused
    pub fn check_compatibility(&self, metadata: &CacheMetadata, partition: usize) -> Result<(), String> {
        if metadata.format_version != CACHE_FORMAT_VERSION {
            return Err(format!(
                "format version {} (expected {})",
                metadata.format_version, CACHE_FORMAT_VERSION
            ));
        }
        if metadata.partition != partition {
            return Err(format!("partition {} (expected {})", metadata.partition, partition));
        }
        let ours = &self.settings;
        let theirs = &metadata.settings;
        if theirs.vocab_fingerprint != ours.vocab_fingerprint {
            return Err("vocabulary changed".to_string());
        }
        if theirs.hasher_type != ours.hasher_type {
            return Err(format!("hasher '{}' (expected '{}')", theirs.hasher_type, ours.hasher_type));
        }
        if theirs.seed != ours.seed || theirs.sample_ratio != ours.sample_ratio {
            return Err("sampling parameters changed".to_string());
        }
        if theirs.num_partitions != ours.num_partitions {
            return Err(format!(
                "{} partitions (expected {})",
                theirs.num_partitions, ours.num_partitions
            ));
        }
        if theirs.input_fingerprint != ours.input_fingerprint {
            return Err("input files changed".to_string());
        }
        if theirs.id_filters != ours.id_filters {
            return Err("id filters changed".to_string());
        }
        Ok(())
    }

    fn read_metadata(&self, partition: usize) -> Result<Option<CacheMetadata>, String> {
        let path = self.metadata_path(partition);
        if !path.exists() || !self.path(partition).exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read cache metadata '{}': {}", path.display(), e))?;
        let metadata = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse cache metadata '{}': {}", path.display(), e))?;
        Ok(Some(metadata))
    }

    /// Reuse state of a partition; only the metadata sidecar is read
    pub fn state(&self, partition: usize) -> CacheState {
        match self.read_metadata(partition) {
            Ok(None) => CacheState::Missing,
            Ok(Some(metadata)) => match self.check_compatibility(&metadata, partition) {
                Ok(()) => CacheState::Ready,
                Err(reason) => CacheState::Stale(reason),
            },
            Err(e) => CacheState::Stale(e),
        }
    }

    /// Load a partition; `Ok(None)` when absent or incompatible
    pub fn load(&self, partition: usize) -> Result<Option<Vec<CodePair>>, String> {
        let metadata = match self.read_metadata(partition)? {
            Some(metadata) => metadata,
            None => return Ok(None),
        };
        if self.check_compatibility(&metadata, partition).is_err() {
            return Ok(None);
        }
        let path = self.path(partition);

        let compressed = fs::read(&path)
            .map_err(|e| format!("Failed to read cache file '{}': {}", path.display(), e))?;
        let decompressed = lz4_flex::decompress_size_prepended(&compressed)
            .map_err(|e| format!("Failed to decompress cache '{}': {}", path.display(), e))?;
        let documents: Vec<CodePair> = bincode::deserialize(&decompressed)
            .map_err(|e| format!("Failed to deserialize cache '{}': {}", path.display(), e))?;

        if documents.len() != metadata.num_documents {
            return Err(format!(
                "Cache '{}' holds {} documents, metadata says {}",
                path.display(),
                documents.len(),
                metadata.num_documents
            ));
        }
        Ok(Some(documents))
    }

    /// Save a partition. Both files go through a temp file and a rename;
    /// the metadata is written last so it only exists next to a complete blob.
    pub fn save(&self, partition: usize, documents: &[CodePair]) -> Result<(), String> {
        let metadata = CacheMetadata {
            format_version: CACHE_FORMAT_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            partition,
            num_documents: documents.len(),
            settings: self.settings.clone(),
        };

        let serialized = bincode::serialize(documents)
            .map_err(|e| format!("Failed to serialize cache: {}", e))?;
        let compressed = lz4_flex::compress_prepend_size(&serialized);
        write_atomically(&self.path(partition), &compressed)?;

        let json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| format!("Failed to serialize cache metadata: {}", e))?;
        write_atomically(&self.metadata_path(partition), json.as_bytes())
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)
        .map_err(|e| format!("Failed to write cache file '{}': {}", tmp.display(), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| format!("Failed to move cache file into '{}': {}", path.display(), e))
}
