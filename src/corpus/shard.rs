// shard.rs - Shuffle the corpus and cut it into source blocks

use super::record::{CodeRecord, RECORD_DELIMITER};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Records per block; the last blocks may be short or empty
pub fn block_size(num_records: usize, num_blocks: usize) -> usize {
    num_records / num_blocks + 1
}

/// Seeded permutation of `0..n`
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

pub fn block_file_name(index: usize) -> String {
    format!("block_{}.txt", index)
}

/// Write `num_blocks` block files into `outdir`
pub fn write_blocks(
    records: &[CodeRecord],
    outdir: &Path,
    num_blocks: usize,
    seed: u64,
    with_docstrings: bool,
) -> Result<Vec<PathBuf>, String> {
    if num_blocks == 0 {
        return Err("num_blocks must be greater than zero".to_string());
    }
    fs::create_dir_all(outdir)
        .map_err(|e| format!("Failed to create output directory '{}': {}", outdir.display(), e))?;

    let order = shuffled_indices(records.len(), seed);
    let size = block_size(records.len(), num_blocks);

    (0..num_blocks)
        .into_par_iter()
        .map(|i| {
            let start = (i * size).min(order.len());
            let end = ((i + 1) * size).min(order.len());
            let path = outdir.join(block_file_name(i));
            let file = File::create(&path)
                .map_err(|e| format!("Failed to create block '{}': {}", path.display(), e))?;
            let mut writer = BufWriter::new(file);
            for &idx in &order[start..end] {
                let line = records[idx].to_block_record(with_docstrings);
                write!(writer, "{}{}", line, RECORD_DELIMITER)
                    .map_err(|e| format!("Write error in '{}': {}", path.display(), e))?;
            }
            writer
                .flush()
                .map_err(|e| format!("Flush error in '{}': {}", path.display(), e))?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::reader::read_block_file;

    #[test]
    fn test_block_size() {
        assert_eq!(block_size(10, 4), 3);
        assert_eq!(block_size(8, 4), 3);
        assert_eq!(block_size(0, 4096), 1);
    }

    #[test]
    fn test_shuffle_is_seeded_permutation() {
        let a = shuffled_indices(100, 12345);
        let b = shuffled_indices(100, 12345);
        let c = shuffled_indices(100, 1);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_write_blocks_covers_every_record_once() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (0..10)
            .map(|i| CodeRecord::new(format!("go_{}", i), "doc", format!("line1\r\nline{}", i)))
            .collect();

        let paths = write_blocks(&records, dir.path(), 4, 7, true).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths[0].ends_with("block_0.txt"));

        let mut seen = Vec::new();
        let mut sizes = Vec::new();
        for path in &paths {
            let block = read_block_file(path).unwrap();
            assert_eq!(block.skipped, 0);
            sizes.push(block.records.len());
            for record in block.records {
                assert_eq!(record.docstring, "doc");
                assert!(!record.code.contains('\r'));
                seen.push(record.id);
            }
        }
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        seen.sort();
        let mut expected: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_zero_blocks_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_blocks(&[], dir.path(), 0, 1, false).is_err());
    }
}
