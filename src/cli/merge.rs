// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.code.is_none() {
            self.code = config.code;
        }
        if self.sink.is_none() {
            self.sink = config.sink;
        }
        if self.vocab_file.is_none() {
            self.vocab_file = config.vocab_file;
        }

        // Core settings (only override defaults, not explicit CLI values)
        if let Some(value) = config.output_format.filter(|_| self.output_format == "parquet") {
            self.output_format = value;
        }
        if let Some(value) = config.schedule.filter(|_| self.schedule == "mpi") {
            self.schedule = value;
        }
        if let Some(value) = config.hasher_type.filter(|_| self.hasher_type == "crc32") {
            self.hasher_type = value;
        }
        if let Some(value) = config.truncation.filter(|_| self.truncation == "random") {
            self.truncation = value;
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.local_n_workers.is_none() {
            self.local_n_workers = config.local_n_workers;
        }
        if let Some(value) = config.local_threads_per_worker.filter(|_| self.local_threads_per_worker == 1) {
            self.local_threads_per_worker = value;
        }

        // Partitioning and sampling
        if self.block_size.is_none() && self.num_blocks.is_none() {
            self.block_size = config.block_size;
            self.num_blocks = config.num_blocks;
        }
        if let Some(value) = config.sample_ratio.filter(|_| self.sample_ratio == 0.9) {
            self.sample_ratio = value;
        }
        if let Some(value) = config.seed.filter(|_| self.seed == 12345) {
            self.seed = value;
        }
        if self.include_ids.is_none() {
            self.include_ids = config.include_ids;
        }
        if self.exclude_ids.is_none() {
            self.exclude_ids = config.exclude_ids;
        }

        // Instances
        if let Some(value) = config.target_seq_length.filter(|_| self.target_seq_length == 128) {
            self.target_seq_length = value;
        }
        if let Some(value) = config.short_seq_prob.filter(|_| self.short_seq_prob == 0.1) {
            self.short_seq_prob = value;
        }
        if self.bin_size.is_none() {
            self.bin_size = config.bin_size;
        }
        if let Some(value) = config.duplicate_factor.filter(|_| self.duplicate_factor == 1) {
            self.duplicate_factor = value;
        }
        if let Some(value) = config.masked_lm_ratio.filter(|_| self.masked_lm_ratio == 0.15) {
            self.masked_lm_ratio = value;
        }

        // Cache
        if self.cache_dir.is_none() {
            self.cache_dir = config.cache_dir;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.masking && config.masking.unwrap_or(false) {
            self.masking = true;
        }
        if !self.force_recompute && config.force_recompute.unwrap_or(false) {
            self.force_recompute = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
