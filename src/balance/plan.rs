// plan.rs - Shard sizes and input grouping for the load balancer

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Bin index of a `*.bin_{b}.parquet` file name
pub fn bin_of_name(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(".parquet")?;
    let (_, bin) = stem.rsplit_once(".bin_")?;
    bin.parse().ok()
}

/// First run of ASCII digits in a file name
fn first_number(name: &str) -> Option<usize> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// A parquet file waiting to be rebalanced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub bin: Option<usize>,
    /// Index parsed from the name (`part.{index}...`), used for ordering
    pub index: Option<usize>,
}

impl InputFile {
    /// Classify a file name; `Ok(None)` for files that are not parquet
    pub fn from_path(path: &Path) -> Result<Option<Self>, String> {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if name.ends_with(".parquet") => name,
            _ => return Ok(None),
        };
        if name.starts_with("shard-") {
            return Err(format!(
                "'{}' is already a balanced shard; remove earlier shards before balancing again",
                path.display()
            ));
        }
        Ok(Some(Self {
            path: path.to_path_buf(),
            bin: bin_of_name(name),
            index: first_number(name),
        }))
    }

    fn sort_key(&self) -> (usize, &Path) {
        (self.index.unwrap_or(usize::MAX), &self.path)
    }
}

/// Parquet inputs of a directory grouped by bin, each group in partition order
pub fn discover_groups(indir: &Path) -> Result<BTreeMap<Option<usize>, Vec<InputFile>>, String> {
    let entries = fs::read_dir(indir)
        .map_err(|e| format!("Failed to list input directory '{}': {}", indir.display(), e))?;

    let mut groups: BTreeMap<Option<usize>, Vec<InputFile>> = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry in '{}': {}", indir.display(), e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(input) = InputFile::from_path(&path)? {
            groups.entry(input.bin).or_default().push(input);
        }
    }
    for files in groups.values_mut() {
        files.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
    Ok(groups)
}

/// Rows per shard: `total / k`, plus one for the first `total % k` shards
pub fn shard_sizes(total_rows: usize, num_shards: usize) -> Vec<usize> {
    if num_shards == 0 {
        return Vec::new();
    }
    let base = total_rows / num_shards;
    let extra = total_rows % num_shards;
    (0..num_shards)
        .map(|s| base + usize::from(s < extra))
        .collect()
}

/// `shard-{s}.parquet` or `shard-{s}.bin_{b}.parquet`
pub fn shard_file_name(shard: usize, bin: Option<usize>) -> String {
    match bin {
        Some(b) => format!("shard-{}.bin_{}.parquet", shard, b),
        None => format!("shard-{}.parquet", shard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_sizes() {
        assert_eq!(shard_sizes(10, 4), vec![3, 3, 2, 2]);
        assert_eq!(shard_sizes(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(shard_sizes(8, 4), vec![2, 2, 2, 2]);
        assert_eq!(shard_sizes(0, 3), vec![0, 0, 0]);
        assert!(shard_sizes(5, 0).is_empty());
    }

    #[test]
    fn test_classify_names() {
        let binned = InputFile::from_path(Path::new("/d/part.12.bin_3.parquet")).unwrap().unwrap();
        assert_eq!(binned.bin, Some(3));
        assert_eq!(binned.index, Some(12));

        let plain = InputFile::from_path(Path::new("/d/part.7.parquet")).unwrap().unwrap();
        assert_eq!(plain.bin, None);
        assert_eq!(plain.index, Some(7));

        assert_eq!(InputFile::from_path(Path::new("/d/part.7.txt")).unwrap(), None);
        assert!(InputFile::from_path(Path::new("/d/shard-0.parquet")).is_err());
    }

    #[test]
    fn test_groups_sorted_by_partition_index() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["part.10.bin_0.parquet", "part.2.bin_0.parquet", "part.1.bin_1.parquet", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let groups = discover_groups(dir.path()).unwrap();
        assert_eq!(groups.len(), 2);

        let bin0: Vec<_> = groups[&Some(0)].iter().map(|f| f.index).collect();
        assert_eq!(bin0, vec![Some(2), Some(10)]);
        assert_eq!(groups[&Some(1)].len(), 1);
    }

    #[test]
    fn test_bin_of_name() {
        assert_eq!(bin_of_name("part.3.bin_12.parquet"), Some(12));
        assert_eq!(bin_of_name("shard-0.bin_0.parquet"), Some(0));
        assert_eq!(bin_of_name("part.3.parquet"), None);
        assert_eq!(bin_of_name("part.3.bin_x.parquet"), None);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(shard_file_name(3, None), "shard-3.parquet");
        assert_eq!(shard_file_name(0, Some(5)), "shard-0.bin_5.parquet");
    }
}
