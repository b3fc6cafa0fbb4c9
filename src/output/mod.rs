// mod.rs - Output writers for preprocessed partitions

pub mod binning;
pub mod parquet_io;
pub mod txt;

pub use binning::BinSpec;

use crate::core::pairs::PairInstance;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Parquet,
    Txt,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "txt" => Ok(OutputFormat::Txt),
            _ => Err(format!("Format {} not supported! Use: parquet, txt", s)),
        }
    }
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Txt => "txt",
        }
    }
}

/// Ensure parent directory exists before creating file
pub fn ensure_parent_dir(file_path: &Path) -> Result<(), String> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| {
                format!("Failed to create parent directory '{}': {}", parent.display(), e)
            })?;
        }
    }
    Ok(())
}

/// Expand `~` and make sure the output directory exists
pub fn expand_outdir_and_mkdir(outdir: &str) -> Result<PathBuf, String> {
    let expanded = match outdir.strip_prefix("~/") {
        Some(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => PathBuf::from(outdir),
        },
        None => PathBuf::from(outdir),
    };
    create_dir_all(&expanded)
        .map_err(|e| format!("Failed to create output directory '{}': {}", expanded.display(), e))?;
    Ok(expanded)
}

/// `part.{p}.{ext}` or `part.{p}.bin_{b}.{ext}`
pub fn partition_file_name(partition: usize, bin: Option<usize>, format: OutputFormat) -> String {
    match bin {
        Some(b) => format!("part.{}.bin_{}.{}", partition, b, format.extension()),
        None => format!("part.{}.{}", partition, format.extension()),
    }
}

/// What a partition write produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSummary {
    pub files: Vec<PathBuf>,
    pub rows: usize,
}

/// Write the instances of one partition, split into bins when requested
pub fn write_partition(
    sink: &Path,
    partition: usize,
    instances: &[PairInstance],
    format: OutputFormat,
    bins: Option<&BinSpec>,
    masking: bool,
) -> Result<PartitionSummary, String> {
    let groups: Vec<(Option<usize>, Vec<&PairInstance>)> = match bins {
        Some(bin_spec) => bin_spec
            .split(instances)
            .into_iter()
            .enumerate()
            .filter(|(_, group)| !group.is_empty())
            .map(|(b, group)| (Some(b), group))
            .collect(),
        None => vec![(None, instances.iter().collect())],
    };

    let schema = parquet_io::instance_schema(bins.is_some(), masking);
    let mut summary = PartitionSummary::default();
    for (bin, group) in groups {
        let path = sink.join(partition_file_name(partition, bin, format));
        match format {
            OutputFormat::Parquet => {
                let batch = parquet_io::instances_to_batch(&group, &schema, bin)?;
                parquet_io::write_batches(&path, &schema, &[batch])?;
            }
            OutputFormat::Txt => txt::write_text_lines(&path, &group)?,
        }
        summary.rows += group.len();
        summary.files.push(path);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: &str, num_tokens: u16) -> PairInstance {
        PairInstance {
            id: id.to_string(),
            doc: "d".to_string(),
            code: "c".to_string(),
            num_tokens,
            masked: None,
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(partition_file_name(7, None, OutputFormat::Parquet), "part.7.parquet");
        assert_eq!(partition_file_name(7, Some(2), OutputFormat::Txt), "part.7.bin_2.txt");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PARQUET".parse::<OutputFormat>(), Ok(OutputFormat::Parquet));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_write_binned_partition_skips_empty_bins() {
        let dir = tempfile::tempdir().unwrap();
        let bin_spec = BinSpec::new(32, 128).unwrap();
        let instances = vec![instance("a", 10), instance("b", 120), instance("c", 20)];

        let summary =
            write_partition(dir.path(), 3, &instances, OutputFormat::Parquet, Some(&bin_spec), false).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.files.len(), 2);
        assert!(summary.files[0].ends_with("part.3.bin_0.parquet"));
        assert!(summary.files[1].ends_with("part.3.bin_3.parquet"));

        let (rows, _) = parquet_io::parquet_metadata(&summary.files[0]).unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_write_txt_partition() {
        let dir = tempfile::tempdir().unwrap();
        let instances = vec![instance("go_1", 5)];
        let summary =
            write_partition(dir.path(), 0, &instances, OutputFormat::Txt, None, false).unwrap();
        let content = std::fs::read_to_string(&summary.files[0]).unwrap();
        assert_eq!(content, "go_1 [CLS] d [SEP] c [SEP] - 5\n");
    }

    #[test]
    fn test_expand_outdir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b");
        let out = expand_outdir_and_mkdir(target.to_str().unwrap()).unwrap();
        assert!(out.is_dir());
    }
}
