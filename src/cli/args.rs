// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// preprocess_codebert_pretrain - Build CodeBERT pretraining instances from source blocks
pub struct Args {
    /// how ranks are launched: mpi, local (default: mpi)
    #[argh(option, default = "String::from(\"mpi\")")]
    pub schedule: String,

    /// number of local workers for --schedule local (default: CPU count)
    #[argh(option)]
    pub local_n_workers: Option<usize>,

    /// threads per local worker for --schedule local (default: 1)
    #[argh(option, default = "1")]
    pub local_threads_per_worker: usize,

    /// directory of source block files (*.txt)
    #[argh(option)]
    pub code: Option<String>,

    /// output directory for the preprocessed partitions
    #[argh(option)]
    pub sink: Option<String>,

    /// output format: parquet, txt (default: parquet)
    #[argh(option, default = "String::from(\"parquet\")")]
    pub output_format: String,

    /// maximum sequence length of an instance (default: 128)
    #[argh(option, default = "128")]
    pub target_seq_length: usize,

    /// probability of using only the first docstring segment (default: 0.1)
    #[argh(option, default = "0.1")]
    pub short_seq_prob: f64,

    /// approximate input bytes per partition, e.g. 256M (exclusive with --num-blocks)
    #[argh(option)]
    pub block_size: Option<String>,

    /// number of partitions (exclusive with --block-size)
    #[argh(option)]
    pub num_blocks: Option<usize>,

    /// split output into sequence-length bins of this width
    #[argh(option)]
    pub bin_size: Option<usize>,

    /// fraction of records kept (default: 0.9)
    #[argh(option, default = "0.9")]
    pub sample_ratio: f64,

    /// random seed (default: 12345)
    #[argh(option, default = "12345")]
    pub seed: u64,

    /// number of instance-creation passes over every partition (default: 1)
    #[argh(option, default = "1")]
    pub duplicate_factor: usize,

    /// vocab.txt, tokenizer.json, or a directory holding either (default: codebert_tokenizer/vocab.txt)
    #[argh(option)]
    pub vocab_file: Option<String>,

    /// apply static masking and store the masked positions and labels
    #[argh(switch)]
    pub masking: bool,

    /// fraction of tokens to mask (default: 0.15)
    #[argh(option, default = "0.15")]
    pub masked_lm_ratio: f64,

    /// truncation of over-long sequences: random, tail (default: random)
    #[argh(option, default = "String::from(\"random\")")]
    pub truncation: String,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// record hasher for sampling and partitioning: crc32, sha256, md5 (default: crc32)
    #[argh(option, default = "String::from(\"crc32\")")]
    pub hasher_type: String,

    /// directory for the tokenized partition cache
    #[argh(option)]
    pub cache_dir: Option<String>,

    /// ignore existing caches and tokenize again
    #[argh(switch)]
    pub force_recompute: bool,

    /// keep only records whose id matches this regex
    #[argh(option)]
    pub include_ids: Option<String>,

    /// drop records whose id matches this regex
    #[argh(option)]
    pub exclude_ids: Option<String>,

    /// validate inputs and report the plan without writing output
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
