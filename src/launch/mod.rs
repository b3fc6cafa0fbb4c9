// mod.rs - docker/mpirun command lines for the preprocessing binaries

pub mod config;

pub use config::LaunchConfig;

use std::process::Command;

pub const PREPROCESS_BINARY: &str = "preprocess_codebert_pretrain";
pub const BALANCE_BINARY: &str = "balance_dask_output";

/// Arguments forwarded to `preprocess_codebert_pretrain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessJob {
    pub target_seq_length: usize,
    pub code: String,
    pub sink: String,
    pub vocab_file: Option<String>,
    pub bin_size: Option<usize>,
    pub num_blocks: usize,
    pub seed: u64,
    pub masking: bool,
    pub extra_args: Vec<String>,
}

/// Arguments forwarded to `balance_dask_output`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceJob {
    pub indir: String,
    pub num_shards: usize,
    pub outdir: Option<String>,
    pub keep_orig: bool,
}

fn docker_prefix(config: &LaunchConfig) -> Vec<String> {
    let mut argv: Vec<String> = ["docker", "run", "--rm", "--init", "--ipc=host"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for mount in &config.mounts {
        argv.push("-v".to_string());
        argv.push(mount.clone());
    }
    argv.extend(config.docker_args.iter().cloned());
    argv.push(config.image.clone());
    argv
}

fn mpirun_prefix(config: &LaunchConfig) -> Vec<String> {
    let mut argv = vec![
        "mpirun".to_string(),
        "-np".to_string(),
        config.np.to_string(),
        "--oversubscribe".to_string(),
        "--allow-run-as-root".to_string(),
    ];
    if !config.ld_preload.is_empty() {
        argv.push("-x".to_string());
        argv.push(format!("LD_PRELOAD={}", config.ld_preload));
    }
    argv.extend(config.mpirun_args.iter().cloned());
    argv
}

/// `docker run ... IMAGE mpirun -np N ... preprocess_codebert_pretrain --schedule mpi ...`
pub fn preprocess_command(config: &LaunchConfig, job: &PreprocessJob) -> Vec<String> {
    let mut argv = docker_prefix(config);
    argv.extend(mpirun_prefix(config));
    argv.push(PREPROCESS_BINARY.to_string());
    argv.extend([
        "--schedule".to_string(),
        "mpi".to_string(),
        "--target-seq-length".to_string(),
        job.target_seq_length.to_string(),
        "--code".to_string(),
        job.code.clone(),
        "--sink".to_string(),
        job.sink.clone(),
    ]);
    if let Some(vocab) = &job.vocab_file {
        argv.push("--vocab-file".to_string());
        argv.push(vocab.clone());
    }
    if let Some(bin_size) = job.bin_size {
        argv.push("--bin-size".to_string());
        argv.push(bin_size.to_string());
    }
    argv.extend([
        "--num-blocks".to_string(),
        job.num_blocks.to_string(),
        "--seed".to_string(),
        job.seed.to_string(),
    ]);
    if job.masking {
        argv.push("--masking".to_string());
    }
    argv.extend(job.extra_args.iter().cloned());
    argv
}

/// `docker run ... IMAGE balance_dask_output --indir D --num-shards K`
pub fn balance_command(config: &LaunchConfig, job: &BalanceJob) -> Vec<String> {
    let mut argv = docker_prefix(config);
    argv.extend([
        BALANCE_BINARY.to_string(),
        "--indir".to_string(),
        job.indir.clone(),
        "--num-shards".to_string(),
        job.num_shards.to_string(),
    ]);
    if let Some(outdir) = &job.outdir {
        argv.push("--outdir".to_string());
        argv.push(outdir.clone());
    }
    if job.keep_orig {
        argv.push("--keep-orig".to_string());
    }
    argv
}

/// POSIX single-quote an argument when it needs quoting
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Copy-pasteable shell rendering of a command line
pub fn render(argv: &[String]) -> String {
    argv.iter().map(|a| shell_quote(a)).collect::<Vec<_>>().join(" ")
}

/// Run a command, turning a failed exit status into an error
pub fn run(argv: &[String]) -> Result<(), String> {
    let (program, args) = argv.split_first().ok_or("Empty command line")?;
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| format!("Failed to start '{}': {}", program, e))?;
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(format!("'{}' exited with status {}", program, code)),
        None => Err(format!("'{}' was terminated by a signal", program)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LaunchConfig {
        LaunchConfig {
            image: "lddl:latest".to_string(),
            mounts: vec!["/data:/workspace".to_string()],
            ..LaunchConfig::default()
        }
    }

    fn job() -> PreprocessJob {
        PreprocessJob {
            target_seq_length: 128,
            code: "/workspace/source".to_string(),
            sink: "/workspace/pretrain".to_string(),
            vocab_file: None,
            bin_size: Some(32),
            num_blocks: 4096,
            seed: 42,
            masking: false,
            extra_args: Vec::new(),
        }
    }

    #[test]
    fn test_preprocess_command_line() {
        let argv = preprocess_command(&config(), &job());
        assert_eq!(
            render(&argv),
            "docker run --rm --init --ipc=host -v /data:/workspace lddl:latest \
             mpirun -np 64 --oversubscribe --allow-run-as-root \
             -x LD_PRELOAD=/usr/lib/x86_64-linux-gnu/libjemalloc.so \
             preprocess_codebert_pretrain --schedule mpi --target-seq-length 128 \
             --code /workspace/source --sink /workspace/pretrain --bin-size 32 \
             --num-blocks 4096 --seed 42"
        );
    }

    #[test]
    fn test_preprocess_with_vocab_and_no_preload() {
        let mut config = config();
        config.ld_preload.clear();
        config.np = 8;
        let mut job = job();
        job.vocab_file = Some("/workspace/vocab.txt".to_string());
        job.bin_size = None;
        job.target_seq_length = 512;
        let argv = preprocess_command(&config, &job);

        assert!(!argv.iter().any(|a| a.starts_with("LD_PRELOAD")));
        let np = argv.iter().position(|a| a == "-np").unwrap();
        assert_eq!(argv[np + 1], "8");
        let vocab = argv.iter().position(|a| a == "--vocab-file").unwrap();
        assert_eq!(argv[vocab + 1], "/workspace/vocab.txt");
        assert!(!argv.contains(&"--bin-size".to_string()));
    }

    #[test]
    fn test_balance_has_no_mpirun() {
        let argv = balance_command(
            &config(),
            &BalanceJob {
                indir: "/workspace/pretrain".to_string(),
                num_shards: 4096,
                outdir: None,
                keep_orig: false,
            },
        );
        assert_eq!(
            render(&argv),
            "docker run --rm --init --ipc=host -v /data:/workspace lddl:latest \
             balance_dask_output --indir /workspace/pretrain --num-shards 4096"
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/a/b"), "/a/b");
        assert_eq!(shell_quote("with space"), "'with space'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_run_propagates_exit_status() {
        assert!(run(&["true".to_string()]).is_ok());
        let err = run(&["sh".to_string(), "-c".to_string(), "exit 3".to_string()]).unwrap_err();
        assert!(err.contains("status 3"));
        assert!(run(&[]).is_err());
    }
}
