// balance_dask_output.rs - Rebalance preprocessed partitions into equal-sized shards

use argh::FromArgs;
use codebert_prep::balance::{balance, BalanceConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(FromArgs)]
/// balance_dask_output - Redistribute parquet partitions into num-shards shards per bin
struct Args {
    /// directory of part.*.parquet files
    #[argh(option)]
    indir: String,

    /// number of shards per bin
    #[argh(option)]
    num_shards: usize,

    /// output directory (default: indir)
    #[argh(option)]
    outdir: Option<String>,

    /// keep the original partition files
    #[argh(switch)]
    keep_orig: bool,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    threads: Option<usize>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Args = argh::from_env();
    let start = Instant::now();

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
    }

    let config = BalanceConfig {
        indir: PathBuf::from(&args.indir),
        outdir: PathBuf::from(args.outdir.as_deref().unwrap_or(&args.indir)),
        num_shards: args.num_shards,
        keep_orig: args.keep_orig,
    };
    println!("⚖️  Balancing {} into {} shards per bin", args.indir, args.num_shards);

    let groups = balance(&config)?;
    for group in &groups {
        let label = match group.bin {
            Some(b) => format!("bin {}", b),
            None => "unbinned".to_string(),
        };
        let max = group.shard_rows.iter().max().copied().unwrap_or(0);
        let min = group.shard_rows.iter().min().copied().unwrap_or(0);
        println!(
            "  • {}: {} files, {} rows → {} shards ({}-{} rows each)",
            label,
            group.inputs,
            group.rows,
            group.shard_rows.len(),
            min,
            max
        );
    }
    println!("✅ Balanced {} groups in {:.2}s", groups.len(), start.elapsed().as_secs_f64());
    Ok(())
}
