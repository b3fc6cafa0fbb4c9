// main.rs - CLI entry point of preprocess_codebert_pretrain

use codebert_prep::cli::Config;
use codebert_prep::corpus::reader::list_block_files;
use codebert_prep::output::expand_outdir_and_mkdir;
use codebert_prep::prelude::*;
use std::time::Instant;

fn main() {
    if let Err(e) = run_main() {
        let prefix = WorldInfo::diagnostic_prefix(|name| std::env::var(name).ok());
        eprintln!("{}❌ ERROR: {}", prefix, e);
        std::process::exit(1);
    }
}

fn configure_threads(args: &Args, schedule: Schedule) -> Result<usize, String> {
    let threads = match (args.threads, schedule) {
        (Some(n), _) => Some(n),
        (None, Schedule::Local) => {
            let workers = match args.local_n_workers {
                Some(n) => n,
                None => std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1),
            };
            Some(workers * args.local_threads_per_worker)
        }
        (None, Schedule::Mpi) => None,
    };
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
    }
    Ok(rayon::current_num_threads())
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    // Validate all arguments
    let validation = validate_args(&args)?;
    let world = WorldInfo::for_schedule(validation.schedule)?;
    let threads = configure_threads(&args, validation.schedule)?;

    if world.is_root() {
        println!("🚀 preprocess_codebert_pretrain v{}", codebert_prep::VERSION);
        println!("🌐 Schedule: {} ({} ranks)", validation.schedule.as_str(), world.size);
        println!("🧵 Threads per rank: {}", threads);
        println!("🔨 Hasher: {}", args.hasher_type);
        println!(
            "📏 Target sequence length: {}{}",
            args.target_seq_length,
            match &validation.bins {
                Some(bins) => format!(" ({} bins of {})", bins.nbins, bins.bin_size),
                None => String::new(),
            }
        );
        if args.masking {
            println!("🎭 Static masking: ratio {}", args.masked_lm_ratio);
        }
    }

    let mut registry = HasherRegistry::new();
    let hasher = registry
        .take_hasher(&args.hasher_type)
        .ok_or_else(|| format!("Invalid hasher type '{}'", args.hasher_type))?;

    let tokenizer = HfTokenizer::from_path(&validation.vocab_path)?;
    if world.is_root() {
        println!(
            "📖 Vocabulary: {} ({} tokens)",
            tokenizer.source().display(),
            tokenizer.vocab_words().len()
        );
    }

    if args.dry_run {
        let files = list_block_files(&validation.source)?;
        let num_partitions = validation.partitioning.num_partitions(&files)?;
        if world.is_root() {
            println!("✅ Dry run completed successfully");
            println!(
                "📊 {} input files → {} partitions, {} per rank",
                files.len(),
                num_partitions,
                world.owned_partitions(num_partitions).len()
            );
        }
        return Ok(());
    }

    let sink = expand_outdir_and_mkdir(&validation.sink)?;
    let config = validation.pipeline_config(&args, sink);

    let total_start = Instant::now();
    let summary = Pipeline::new(config, &tokenizer, hasher.as_ref(), world).run()?;

    if world.is_root() {
        println!("\n📈 === SUMMARY (rank 0) ===");
        println!("  • Partitions: {} total, {} on this rank", summary.num_partitions, summary.owned_partitions);
        if summary.cached_partitions > 0 {
            println!("  • From token cache: {}", summary.cached_partitions);
        }
        println!("  • Records read: {}", summary.records_read);
        if summary.filtered_records > 0 {
            println!("  • Filtered by id: {}", summary.filtered_records);
        }
        println!("  • Sampled out: {}", summary.sampled_out);
        println!("  • Documents: {}", summary.documents);
        println!("  • Instances: {}", summary.instances);
        println!("  • Files written: {}", summary.files);
        println!("⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    }
    Ok(())
}
