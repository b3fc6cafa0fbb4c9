// inspector.rs - Inspect preprocessed output and token caches
// Features: per-file row and token-length statistics, per-bin totals, CSV export, cache metadata

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use argh::FromArgs;
use codebert_prep::balance::plan::bin_of_name;
use codebert_prep::output::parquet_io::{column_u16, read_batches, COL_NUM_TOKENS};
use codebert_prep::tokenize::cache::CacheMetadata;
use serde::Serialize;

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

#[derive(FromArgs)]
/// Inspect preprocessed parquet output or a token cache directory
struct Args {
    /// directory of part.* or shard-* parquet files
    #[argh(option)]
    dir: Option<String>,

    /// export per-file statistics to a CSV file
    #[argh(option)]
    csv: Option<String>,

    /// token cache directory to summarize
    #[argh(option)]
    cache_dir: Option<String>,

    /// quiet mode - totals only
    #[argh(switch)]
    quiet: bool,
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Serialize)]
struct FileStats {
    file: String,
    bin: Option<usize>,
    rows: usize,
    min_tokens: u16,
    max_tokens: u16,
    mean_tokens: f64,
    #[serde(skip)]
    token_sum: u64,
}

#[derive(Debug, Default)]
struct BinTotals {
    files: usize,
    rows: usize,
    token_sum: u64,
    min_rows: Option<usize>,
    max_rows: usize,
}

fn list_parquet_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("Failed to list '{}': {}", dir.display(), e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| format!("Failed to read entry in '{}': {}", dir.display(), e))?
            .path();
        if path.extension().and_then(|s| s.to_str()) == Some("parquet") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stats(path: &Path) -> Result<FileStats, String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let bin = bin_of_name(&name);
    let tokens = column_u16(&read_batches(path)?, COL_NUM_TOKENS)?;

    let sum: u64 = tokens.iter().map(|&t| t as u64).sum();
    Ok(FileStats {
        file: name,
        bin,
        rows: tokens.len(),
        min_tokens: tokens.iter().copied().min().unwrap_or(0),
        max_tokens: tokens.iter().copied().max().unwrap_or(0),
        mean_tokens: if tokens.is_empty() { 0.0 } else { sum as f64 / tokens.len() as f64 },
        token_sum: sum,
    })
}

fn write_csv(path: &str, stats: &[FileStats]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to create CSV '{}': {}", path, e))?;
    for row in stats {
        writer
            .serialize(row)
            .map_err(|e| format!("Failed to write CSV row: {}", e))?;
    }
    writer
        .flush()
        .map_err(|e| format!("Failed to flush CSV '{}': {}", path, e))
}

fn inspect_output(dir: &Path, args: &Args) -> Result<(), String> {
    let files = list_parquet_files(dir)?;
    if files.is_empty() {
        return Err(format!("No parquet files in '{}'", dir.display()));
    }

    let stats = files
        .iter()
        .map(|path| file_stats(path))
        .collect::<Result<Vec<_>, String>>()?;

    if !args.quiet {
        println!("\n=== FILES ===");
        println!("{:<32} {:>6} {:>10} {:>6} {:>6} {:>8}", "File", "Bin", "Rows", "Min", "Max", "Mean");
        for s in &stats {
            println!(
                "{:<32} {:>6} {:>10} {:>6} {:>6} {:>8.1}",
                s.file,
                s.bin.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string()),
                s.rows,
                s.min_tokens,
                s.max_tokens,
                s.mean_tokens
            );
        }
    }

    let mut bins: BTreeMap<Option<usize>, BinTotals> = BTreeMap::new();
    for s in &stats {
        let totals = bins.entry(s.bin).or_default();
        totals.files += 1;
        totals.rows += s.rows;
        totals.token_sum += s.token_sum;
        totals.min_rows = Some(totals.min_rows.map_or(s.rows, |m| m.min(s.rows)));
        totals.max_rows = totals.max_rows.max(s.rows);
    }

    println!("\n=== BINS ===");
    for (bin, totals) in &bins {
        let label = bin.map(|b| format!("bin {}", b)).unwrap_or_else(|| "unbinned".to_string());
        let mean = if totals.rows == 0 { 0.0 } else { totals.token_sum as f64 / totals.rows as f64 };
        println!(
            "{}: {} files, {} rows, {:.1} tokens/row, {}-{} rows per file",
            label,
            totals.files,
            totals.rows,
            mean,
            totals.min_rows.unwrap_or(0),
            totals.max_rows
        );
    }
    let total_rows: usize = stats.iter().map(|s| s.rows).sum();
    println!("Total: {} files, {} rows", stats.len(), total_rows);

    if let Some(csv_path) = &args.csv {
        write_csv(csv_path, &stats)?;
        println!("📄 Statistics exported to: {}", csv_path);
    }
    Ok(())
}

// ============================================================================
// TOKEN CACHE
// ============================================================================

fn inspect_cache(dir: &Path, quiet: bool) -> Result<(), String> {
    let mut metadata_files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| format!("Failed to list '{}': {}", dir.display(), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(".meta.json"))
                .unwrap_or(false)
        })
        .collect();
    metadata_files.sort();

    println!("\n=== TOKEN CACHE ===");
    let mut documents = 0;
    let mut first: Option<CacheMetadata> = None;
    for path in &metadata_files {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        let metadata: CacheMetadata = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
        if !quiet {
            println!(
                "partition {:>5}: {} documents (created {})",
                metadata.partition, metadata.num_documents, metadata.created
            );
        }
        documents += metadata.num_documents;
        if let Some(reference) = &first {
            if reference.settings != metadata.settings {
                println!("⚠️  {} was built with different settings", path.display());
            }
        } else {
            first = Some(metadata);
        }
    }

    println!("Cached partitions: {}", metadata_files.len());
    println!("Cached documents: {}", documents);
    if let Some(reference) = first {
        let s = &reference.settings;
        println!("Version: {} (format {})", reference.version, reference.format_version);
        println!(
            "Settings: hasher={}, seed={}, sample_ratio={}, partitions={}, vocab={:08x}, input={:08x}",
            s.hasher_type, s.seed, s.sample_ratio, s.num_partitions, s.vocab_fingerprint, s.input_fingerprint
        );
    }
    Ok(())
}

fn main() {
    let args: Args = argh::from_env();
    if args.dir.is_none() && args.cache_dir.is_none() {
        eprintln!("❌ ERROR: nothing to inspect, use --dir and/or --cache-dir");
        std::process::exit(1);
    }

    if let Some(dir) = &args.dir {
        if let Err(e) = inspect_output(Path::new(dir), &args) {
            eprintln!("❌ ERROR: {}", e);
            std::process::exit(1);
        }
    }
    if let Some(dir) = &args.cache_dir {
        if let Err(e) = inspect_cache(Path::new(dir), args.quiet) {
            eprintln!("❌ ERROR: {}", e);
            std::process::exit(1);
        }
    }
}
