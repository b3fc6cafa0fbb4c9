// shard_codebert_data.rs - Shuffle the extracted corpus into source blocks

use argh::FromArgs;
use codebert_prep::corpus::shard::block_size;
use codebert_prep::corpus::{read_jsonl_records, write_blocks};
use std::path::Path;
use std::time::Instant;

#[derive(FromArgs)]
/// shard_codebert_data - Write the corpus as num-blocks shuffled block_{i}.txt files
struct Args {
    /// JSONL corpus produced by extract_raw
    #[argh(option)]
    input: String,

    /// output directory for the blocks
    #[argh(option)]
    outdir: String,

    /// number of blocks (default: 4096)
    #[argh(option, default = "4096")]
    num_blocks: usize,

    /// shuffle seed (default: 12345)
    #[argh(option, default = "12345")]
    seed: u64,

    /// write code only, without docstrings
    #[argh(switch)]
    no_docstrings: bool,

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

    let records = read_jsonl_records(Path::new(&args.input))?;
    println!(
        "📋 Loaded {} records, {} per block",
        records.len(),
        block_size(records.len(), args.num_blocks.max(1))
    );

    let blocks = write_blocks(
        &records,
        Path::new(&args.outdir),
        args.num_blocks,
        args.seed,
        !args.no_docstrings,
    )?;
    println!(
        "✅ Wrote {} blocks to {} in {:.2}s",
        blocks.len(),
        args.outdir,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
