// mod.rs - Rebalance preprocessed partitions into equal-sized shards

pub mod plan;

pub use plan::{discover_groups, shard_file_name, shard_sizes, InputFile};

use crate::output::parquet_io::{create_writer, open_batch_reader, parquet_metadata};
use arrow::datatypes::SchemaRef;
use parquet::arrow::ArrowWriter;
use rayon::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Settings of one balancing run
#[derive(Debug, Clone)]
pub struct BalanceConfig {
    pub indir: PathBuf,
    pub outdir: PathBuf,
    pub num_shards: usize,
    pub keep_orig: bool,
}

/// Result of balancing one bin (or the unbinned output)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub bin: Option<usize>,
    pub inputs: usize,
    pub rows: usize,
    pub shard_rows: Vec<usize>,
}

/// Writes consecutive shards, moving to the next one when the current is full
struct ShardWriter<'a> {
    outdir: &'a Path,
    bin: Option<usize>,
    schema: SchemaRef,
    sizes: Vec<usize>,
    shard: usize,
    remaining: usize,
    writer: Option<ArrowWriter<File>>,
}

impl<'a> ShardWriter<'a> {
    fn new(outdir: &'a Path, bin: Option<usize>, schema: SchemaRef, sizes: Vec<usize>) -> Result<Self, String> {
        let mut shards = Self {
            outdir,
            bin,
            schema,
            remaining: sizes.first().copied().unwrap_or(0),
            sizes,
            shard: 0,
            writer: None,
        };
        shards.writer = Some(shards.open(0)?);
        Ok(shards)
    }

    fn open(&self, shard: usize) -> Result<ArrowWriter<File>, String> {
        create_writer(&self.outdir.join(shard_file_name(shard, self.bin)), &self.schema)
    }

    fn close_current(&mut self) -> Result<(), String> {
        if let Some(writer) = self.writer.take() {
            writer
                .close()
                .map_err(|e| format!("Failed to finalize shard {}: {}", self.shard, e))?;
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<(), String> {
        self.close_current()?;
        self.shard += 1;
        if self.shard >= self.sizes.len() {
            return Err("Inputs hold more rows than their parquet footers report".to_string());
        }
        self.remaining = self.sizes[self.shard];
        self.writer = Some(self.open(self.shard)?);
        Ok(())
    }

    fn write(&mut self, batch: &arrow::record_batch::RecordBatch) -> Result<(), String> {
        let mut offset = 0;
        while offset < batch.num_rows() {
            while self.remaining == 0 {
                self.advance()?;
            }
            let take = self.remaining.min(batch.num_rows() - offset);
            if let Some(writer) = self.writer.as_mut() {
                writer
                    .write(&batch.slice(offset, take))
                    .map_err(|e| format!("Failed to write shard {}: {}", self.shard, e))?;
            }
            offset += take;
            self.remaining -= take;
        }
        Ok(())
    }

    /// Close the open shard and write every remaining shard empty
    fn finish(mut self) -> Result<(), String> {
        self.close_current()?;
        for shard in self.shard + 1..self.sizes.len() {
            self.open(shard)?
                .close()
                .map_err(|e| format!("Failed to finalize shard {}: {}", shard, e))?;
        }
        Ok(())
    }
}

/// Balance the inputs of one bin into `config.num_shards` shards
pub fn balance_group(bin: Option<usize>, inputs: &[InputFile], config: &BalanceConfig) -> Result<GroupSummary, String> {
    let mut schema: Option<SchemaRef> = None;
    let mut total_rows = 0;
    for input in inputs {
        let (rows, file_schema) = parquet_metadata(&input.path)?;
        match &schema {
            Some(expected) if expected.fields() != file_schema.fields() => {
                return Err(format!(
                    "Schema of '{}' differs from the other inputs of its bin",
                    input.path.display()
                ));
            }
            Some(_) => {}
            None => schema = Some(file_schema),
        }
        total_rows += rows;
    }
    let schema = schema.ok_or("No inputs to balance")?;

    let sizes = shard_sizes(total_rows, config.num_shards);
    let mut shards = ShardWriter::new(&config.outdir, bin, schema, sizes.clone())?;
    for input in inputs {
        for batch in open_batch_reader(&input.path)? {
            let batch = batch.map_err(|e| format!("Failed to read '{}': {}", input.path.display(), e))?;
            shards.write(&batch)?;
        }
    }
    shards.finish()?;

    if !config.keep_orig {
        for input in inputs {
            fs::remove_file(&input.path)
                .map_err(|e| format!("Failed to remove '{}': {}", input.path.display(), e))?;
        }
    }

    Ok(GroupSummary {
        bin,
        inputs: inputs.len(),
        rows: total_rows,
        shard_rows: sizes,
    })
}

/// Balance every bin of `config.indir`; bins run in parallel
pub fn balance(config: &BalanceConfig) -> Result<Vec<GroupSummary>, String> {
    if config.num_shards == 0 {
        return Err("Number of shards must be at least 1".to_string());
    }
    let groups = discover_groups(&config.indir)?;
    if groups.is_empty() {
        return Err(format!("No parquet files found in '{}'", config.indir.display()));
    }
    fs::create_dir_all(&config.outdir)
        .map_err(|e| format!("Failed to create output directory '{}': {}", config.outdir.display(), e))?;

    groups
        .par_iter()
        .map(|(bin, inputs)| balance_group(*bin, inputs, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pairs::PairInstance;
    use crate::output::parquet_io::{column_strings, read_batches};
    use crate::output::{write_partition, BinSpec, OutputFormat};

    fn instances(prefix: &str, n: usize, num_tokens: u16) -> Vec<PairInstance> {
        (0..n)
            .map(|i| PairInstance {
                id: format!("{}_{}", prefix, i),
                doc: "doc".to_string(),
                code: "code".to_string(),
                num_tokens,
                masked: None,
            })
            .collect()
    }

    fn rows(path: &Path) -> usize {
        parquet_metadata(path).unwrap().0
    }

    #[test]
    fn test_unbinned_balance_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        write_partition(dir.path(), 0, &instances("a", 7, 10), OutputFormat::Parquet, None, false).unwrap();
        write_partition(dir.path(), 1, &instances("b", 3, 10), OutputFormat::Parquet, None, false).unwrap();

        let config = BalanceConfig {
            indir: dir.path().to_path_buf(),
            outdir: dir.path().to_path_buf(),
            num_shards: 4,
            keep_orig: false,
        };
        let summary = balance(&config).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].rows, 10);
        assert_eq!(summary[0].shard_rows, vec![3, 3, 2, 2]);

        for (s, expected) in [3, 3, 2, 2].iter().enumerate() {
            assert_eq!(rows(&dir.path().join(shard_file_name(s, None))), *expected);
        }
        let shard1 = column_strings(&read_batches(&dir.path().join("shard-1.parquet")).unwrap(), "id").unwrap();
        assert_eq!(shard1, vec!["a_3", "a_4", "a_5"]);
        let shard2 = column_strings(&read_batches(&dir.path().join("shard-2.parquet")).unwrap(), "id").unwrap();
        assert_eq!(shard2, vec!["a_6", "b_0"]);

        assert!(!dir.path().join("part.0.parquet").exists());
    }

    #[test]
    fn test_binned_balance_with_empty_shards() {
        let indir = tempfile::tempdir().unwrap();
        let outdir = tempfile::tempdir().unwrap();
        let bins = BinSpec::new(32, 64).unwrap();
        let mut mixed = instances("short", 3, 10);
        mixed.extend(instances("long", 1, 50));
        write_partition(indir.path(), 0, &mixed, OutputFormat::Parquet, Some(&bins), false).unwrap();

        let config = BalanceConfig {
            indir: indir.path().to_path_buf(),
            outdir: outdir.path().to_path_buf(),
            num_shards: 2,
            keep_orig: true,
        };
        let summary = balance(&config).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(rows(&outdir.path().join("shard-0.bin_0.parquet")), 2);
        assert_eq!(rows(&outdir.path().join("shard-1.bin_0.parquet")), 1);
        assert_eq!(rows(&outdir.path().join("shard-0.bin_1.parquet")), 1);
        assert_eq!(rows(&outdir.path().join("shard-1.bin_1.parquet")), 0);
        assert!(indir.path().join("part.0.bin_0.parquet").exists());
    }

    #[test]
    fn test_rerun_on_shards_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_partition(dir.path(), 0, &instances("a", 2, 10), OutputFormat::Parquet, None, false).unwrap();
        let config = BalanceConfig {
            indir: dir.path().to_path_buf(),
            outdir: dir.path().to_path_buf(),
            num_shards: 2,
            keep_orig: true,
        };
        balance(&config).unwrap();
        assert!(balance(&config).is_err());
    }

    #[test]
    fn test_mismatched_schemas_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bins = BinSpec::new(64, 64).unwrap();
        write_partition(dir.path(), 0, &instances("a", 2, 10), OutputFormat::Parquet, None, false).unwrap();
        // Binned with a single bin lands in bin 0; rename it into the unbinned group
        write_partition(dir.path(), 1, &instances("b", 2, 10), OutputFormat::Parquet, Some(&bins), false).unwrap();
        std::fs::rename(dir.path().join("part.1.bin_0.parquet"), dir.path().join("part.1.parquet")).unwrap();

        let config = BalanceConfig {
            indir: dir.path().to_path_buf(),
            outdir: dir.path().join("out"),
            num_shards: 1,
            keep_orig: true,
        };
        assert!(balance(&config).is_err());
    }
}
