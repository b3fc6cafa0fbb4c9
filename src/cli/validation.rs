// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::pairs::PairConfig;
use crate::core::pipeline::{IdFilter, Partitioning, PipelineConfig};
use crate::core::schedule::Schedule;
use crate::core::truncate::TruncationMode;
use crate::hashers::HasherRegistry;
use crate::output::{BinSpec, OutputFormat};
use crate::tokenize::DEFAULT_VOCAB_PATH;
use regex::Regex;
use std::path::PathBuf;
use std::str::FromStr;

/// Longest sequence whose token count still fits the UInt16 `num_tokens` column
pub const MAX_TARGET_SEQ_LENGTH: usize = u16::MAX as usize;

/// Arguments turned into typed values
#[derive(Debug)]
pub struct ValidationResult {
    pub schedule: Schedule,
    pub output_format: OutputFormat,
    pub truncation: TruncationMode,
    pub partitioning: Partitioning,
    pub bins: Option<BinSpec>,
    pub id_filter: IdFilter,
    pub source: PathBuf,
    pub sink: String,
    pub vocab_path: PathBuf,
}

impl ValidationResult {
    /// Pipeline settings for a resolved sink directory
    pub fn pipeline_config(&self, args: &Args, sink: PathBuf) -> PipelineConfig {
        PipelineConfig {
            source: self.source.clone(),
            sink,
            output_format: self.output_format,
            pairs: PairConfig {
                max_seq_length: args.target_seq_length,
                short_seq_prob: args.short_seq_prob,
                masking: args.masking,
                masked_lm_ratio: args.masked_lm_ratio,
                truncation: self.truncation,
            },
            bins: self.bins,
            partitioning: self.partitioning,
            sample_ratio: args.sample_ratio,
            seed: args.seed,
            duplicate_factor: args.duplicate_factor,
            id_filter: self.id_filter.clone(),
            cache_dir: args.cache_dir.as_ref().map(PathBuf::from),
            force_recompute: args.force_recompute,
        }
    }
}

/// Parse sizes such as `256M`, `1g`, `64KB` or `1000` into bytes (powers of 1024)
pub fn parse_size_str(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    let upper = trimmed.to_uppercase();
    let without_b = match upper.strip_suffix('B') {
        Some(rest) if !rest.is_empty() => rest,
        _ => upper.as_str(),
    };
    let (digits, multiplier) = match without_b.chars().last() {
        Some('K') => (&without_b[..without_b.len() - 1], 1u64 << 10),
        Some('M') => (&without_b[..without_b.len() - 1], 1u64 << 20),
        Some('G') => (&without_b[..without_b.len() - 1], 1u64 << 30),
        Some('T') => (&without_b[..without_b.len() - 1], 1u64 << 40),
        _ => (without_b, 1),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("Invalid size '{}'. Use e.g. 256M, 1G, 4096", s))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("Size '{}' is too large", s))
}

fn check_ratio(name: &str, value: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{} must be between 0.0 and 1.0 (got {})", name, value));
    }
    Ok(())
}

fn compile_regex(name: &str, pattern: &Option<String>) -> Result<Option<Regex>, String> {
    match pattern {
        Some(pattern) => Regex::new(pattern)
            .map(Some)
            .map_err(|e| format!("Invalid {} regex: {}", name, e)),
        None => Ok(None),
    }
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    // Validate hasher type
    let registry = HasherRegistry::new();
    if !registry.has_hasher(&args.hasher_type) {
        return Err(format!(
            "Invalid hasher type '{}'. Available: {}",
            args.hasher_type,
            registry.get_hasher_names().join(", ")
        ));
    }

    let code = args.code.as_ref().ok_or("--code is required")?;
    let sink = args.sink.as_ref().ok_or("--sink is required")?;
    let source = PathBuf::from(code);
    if !source.is_dir() {
        return Err(format!("Source directory '{}' does not exist", code));
    }

    let schedule = Schedule::from_str(&args.schedule)?;
    let output_format = OutputFormat::from_str(&args.output_format)?;
    let truncation = TruncationMode::from_str(&args.truncation)?;

    // Sequence length and bins
    if args.target_seq_length <= 3 || args.target_seq_length > MAX_TARGET_SEQ_LENGTH {
        return Err(format!(
            "Target sequence length must be between 4 and {} (got {})",
            MAX_TARGET_SEQ_LENGTH, args.target_seq_length
        ));
    }
    let bins = match args.bin_size {
        Some(bin_size) => Some(BinSpec::new(bin_size, args.target_seq_length)?),
        None => None,
    };

    // Partitioning
    let partitioning = match (args.num_blocks, &args.block_size) {
        (Some(_), Some(_)) => {
            return Err("--num-blocks and --block-size are mutually exclusive".to_string())
        }
        (Some(0), None) => return Err("--num-blocks must be at least 1".to_string()),
        (Some(n), None) => Partitioning::NumBlocks(n),
        (None, Some(size)) => {
            let bytes = parse_size_str(size)?;
            if bytes == 0 {
                return Err("--block-size must be at least 1 byte".to_string());
            }
            Partitioning::BlockSize(bytes)
        }
        (None, None) => Partitioning::PerFile,
    };

    // Ratios and counts
    check_ratio("Sample ratio", args.sample_ratio)?;
    check_ratio("Short sequence probability", args.short_seq_prob)?;
    check_ratio("Masked LM ratio", args.masked_lm_ratio)?;
    if args.duplicate_factor == 0 {
        return Err("Duplicate factor must be at least 1".to_string());
    }
    if args.local_threads_per_worker == 0 || args.local_n_workers == Some(0) {
        return Err("Local workers and threads per worker must be at least 1".to_string());
    }
    if args.threads == Some(0) {
        return Err("Number of threads must be at least 1".to_string());
    }

    // Compile regex patterns
    let id_filter = IdFilter {
        include: compile_regex("include_ids", &args.include_ids)?,
        exclude: compile_regex("exclude_ids", &args.exclude_ids)?,
    };

    let vocab_path = PathBuf::from(args.vocab_file.as_deref().unwrap_or(DEFAULT_VOCAB_PATH));
    if !vocab_path.exists() {
        return Err(format!("Vocabulary '{}' does not exist", vocab_path.display()));
    }

    Ok(ValidationResult {
        schedule,
        output_format,
        truncation,
        partitioning,
        bins,
        id_filter,
        source,
        sink: sink.clone(),
        vocab_path,
    })
}
