// codebert_launch.rs - Run the preprocessing binaries inside a container

use argh::FromArgs;
use codebert_prep::launch::{self, BalanceJob, LaunchConfig, PreprocessJob};

#[derive(FromArgs)]
/// codebert_launch - Build and run the docker/mpirun invocations of the pipeline
struct Args {
    /// path to launch TOML configuration (image, mounts, np, ld_preload)
    #[argh(option)]
    config: Option<String>,

    /// container image (overrides the configuration)
    #[argh(option)]
    image: Option<String>,

    /// number of MPI ranks (overrides the configuration)
    #[argh(option)]
    np: Option<usize>,

    /// bind mount host:container, repeatable
    #[argh(option, short = 'v')]
    mount: Vec<String>,

    /// print the command instead of running it
    #[argh(switch)]
    dry_run: bool,

    /// print a sample launch configuration and exit
    #[argh(switch)]
    generate_config: bool,

    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Preprocess(PreprocessCommand),
    Balance(BalanceCommand),
}

#[derive(FromArgs)]
/// launch preprocess_codebert_pretrain under mpirun
#[argh(subcommand, name = "preprocess")]
struct PreprocessCommand {
    /// maximum sequence length (default: 128)
    #[argh(option, default = "128")]
    target_seq_length: usize,

    /// source block directory inside the container
    #[argh(option)]
    code: String,

    /// output directory inside the container
    #[argh(option)]
    sink: String,

    /// vocabulary path inside the container
    #[argh(option)]
    vocab_file: Option<String>,

    /// sequence-length bin width
    #[argh(option)]
    bin_size: Option<usize>,

    /// number of partitions (default: 4096)
    #[argh(option, default = "4096")]
    num_blocks: usize,

    /// random seed (default: 42)
    #[argh(option, default = "42")]
    seed: u64,

    /// enable static masking
    #[argh(switch)]
    masking: bool,

    /// extra argument passed through to the preprocessor, repeatable
    #[argh(option)]
    extra_arg: Vec<String>,
}

#[derive(FromArgs)]
/// launch balance_dask_output
#[argh(subcommand, name = "balance")]
struct BalanceCommand {
    /// directory of preprocessed partitions inside the container
    #[argh(option)]
    indir: String,

    /// number of shards per bin (default: 4096)
    #[argh(option, default = "4096")]
    num_shards: usize,

    /// output directory inside the container (default: indir)
    #[argh(option)]
    outdir: Option<String>,

    /// keep the original partition files
    #[argh(switch)]
    keep_orig: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<LaunchConfig, String> {
    let mut config = match &args.config {
        Some(path) => LaunchConfig::from_file(path)?,
        None => LaunchConfig::default(),
    };
    if let Some(image) = &args.image {
        config.image = image.clone();
    }
    if let Some(np) = args.np {
        config.np = np;
    }
    config.mounts.extend(args.mount.iter().cloned());
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), String> {
    let args: Args = argh::from_env();

    if args.generate_config {
        println!("{}", LaunchConfig::generate_sample());
        println!("\n💡 Save this content to a .toml file and use --config /path/to/launch.toml");
        return Ok(());
    }

    let config = load_config(&args)?;
    let argv = match &args.command {
        Some(Command::Preprocess(cmd)) => launch::preprocess_command(
            &config,
            &PreprocessJob {
                target_seq_length: cmd.target_seq_length,
                code: cmd.code.clone(),
                sink: cmd.sink.clone(),
                vocab_file: cmd.vocab_file.clone(),
                bin_size: cmd.bin_size,
                num_blocks: cmd.num_blocks,
                seed: cmd.seed,
                masking: cmd.masking,
                extra_args: cmd.extra_arg.clone(),
            },
        ),
        Some(Command::Balance(cmd)) => launch::balance_command(
            &config,
            &BalanceJob {
                indir: cmd.indir.clone(),
                num_shards: cmd.num_shards,
                outdir: cmd.outdir.clone(),
                keep_orig: cmd.keep_orig,
            },
        ),
        None => return Err("Missing subcommand: preprocess or balance".to_string()),
    };

    if args.dry_run {
        println!("{}", launch::render(&argv));
        return Ok(());
    }

    println!("🚀 {}", launch::render(&argv));
    launch::run(&argv)?;
    println!("✅ Done");
    Ok(())
}
