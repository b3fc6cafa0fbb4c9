// pipeline.rs - Source blocks to pretraining partitions

use crate::core::document::{to_code_pairs, CodePair};
use crate::core::pairs::{create_partition_pairs, PairConfig};
use crate::core::schedule::WorldInfo;
use crate::corpus::reader::{input_fingerprint, list_block_files, read_block_file, total_bytes};
use crate::corpus::record::CodeRecord;
use crate::hashers::CodeHasher;
use crate::output::{write_partition, BinSpec, OutputFormat};
use crate::tokenize::cache::{CacheSettings, CacheState, TokenCache};
use crate::tokenize::tokenizer::SubwordTokenizer;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

const PARTITION_SEED_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// How the input is cut into partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partitioning {
    /// Exactly this many partitions
    NumBlocks(usize),
    /// About this many input bytes per partition
    BlockSize(u64),
    /// One partition per input file
    PerFile,
}

impl Partitioning {
    pub fn num_partitions(&self, files: &[PathBuf]) -> Result<usize, String> {
        let n = match *self {
            Partitioning::NumBlocks(n) => n,
            Partitioning::BlockSize(size) => {
                if size == 0 {
                    return Err("Block size must be greater than zero".to_string());
                }
                total_bytes(files)?.div_ceil(size) as usize
            }
            Partitioning::PerFile => files.len(),
        };
        Ok(n.max(1))
    }
}

/// Include/exclude regexes on record ids
#[derive(Debug, Clone, Default)]
pub struct IdFilter {
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
}

impl IdFilter {
    pub fn accepts(&self, id: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(id) {
                return false;
            }
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(id),
            None => true,
        }
    }

    /// Stable description used in cache metadata
    pub fn describe(&self) -> String {
        format!(
            "include={};exclude={}",
            self.include.as_ref().map(|r| r.as_str()).unwrap_or(""),
            self.exclude.as_ref().map(|r| r.as_str()).unwrap_or("")
        )
    }
}

/// Everything one preprocessing run needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: PathBuf,
    pub sink: PathBuf,
    pub output_format: OutputFormat,
    pub pairs: PairConfig,
    pub bins: Option<BinSpec>,
    pub partitioning: Partitioning,
    pub sample_ratio: f64,
    pub seed: u64,
    pub duplicate_factor: usize,
    pub id_filter: IdFilter,
    pub cache_dir: Option<PathBuf>,
    pub force_recompute: bool,
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub num_partitions: usize,
    pub owned_partitions: usize,
    pub cached_partitions: usize,
    pub records_read: usize,
    pub malformed_records: usize,
    pub filtered_records: usize,
    pub sampled_out: usize,
    pub documents: usize,
    pub instances: usize,
    pub files: usize,
}

/// Partition of a record id
pub fn partition_of(hasher: &dyn CodeHasher, seed: u64, id: &str, num_partitions: usize) -> usize {
    (hasher.keyed_fingerprint(seed, "partition", id) % num_partitions as u64) as usize
}

/// Whether a record id survives sampling
pub fn is_sampled(hasher: &dyn CodeHasher, seed: u64, id: &str, sample_ratio: f64) -> bool {
    hasher.unit_interval(seed, "sample", id) < sample_ratio
}

/// RNG of one partition; independent of rank count and thread scheduling
pub fn partition_rng(seed: u64, partition: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (partition as u64).wrapping_mul(PARTITION_SEED_MULTIPLIER))
}

#[derive(Default)]
struct Gathered {
    by_partition: HashMap<usize, Vec<CodeRecord>>,
    records_read: usize,
    malformed: usize,
    filtered: usize,
    sampled_out: usize,
}

impl Gathered {
    fn merge(mut self, other: Gathered) -> Gathered {
        for (p, mut records) in other.by_partition {
            self.by_partition.entry(p).or_default().append(&mut records);
        }
        self.records_read += other.records_read;
        self.malformed += other.malformed;
        self.filtered += other.filtered;
        self.sampled_out += other.sampled_out;
        self
    }
}

struct PartitionOutcome {
    cached: bool,
    documents: usize,
    instances: usize,
    files: usize,
}

/// Preprocessing of the partitions owned by one rank
pub struct Pipeline<'a> {
    config: PipelineConfig,
    tokenizer: &'a dyn SubwordTokenizer,
    hasher: &'a dyn CodeHasher,
    world: WorldInfo,
    show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: PipelineConfig,
        tokenizer: &'a dyn SubwordTokenizer,
        hasher: &'a dyn CodeHasher,
        world: WorldInfo,
    ) -> Self {
        let show_progress = world.is_root();
        Self {
            config,
            tokenizer,
            hasher,
            world,
            show_progress,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress && self.world.is_root();
        self
    }

    fn log(&self, message: &str) {
        if self.show_progress {
            println!("{}", message);
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("{} ⚠️  {}", self.world, message);
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    fn open_cache(&self, files: &[PathBuf], num_partitions: usize) -> Result<Option<TokenCache>, String> {
        let dir = match &self.config.cache_dir {
            Some(dir) => dir,
            None => return Ok(None),
        };
        let settings = CacheSettings {
            vocab_fingerprint: self.tokenizer.fingerprint(),
            hasher_type: self.hasher.name().to_string(),
            seed: self.config.seed,
            sample_ratio: self.config.sample_ratio,
            num_partitions,
            input_fingerprint: input_fingerprint(files)?,
            id_filters: self.config.id_filter.describe(),
        };
        TokenCache::new(dir.clone(), settings).map(Some)
    }

    /// Read every block and keep the sampled records of the wanted partitions
    fn gather(&self, files: &[PathBuf], num_partitions: usize, wanted: &BTreeSet<usize>) -> Result<Gathered, String> {
        let pb = self.progress_bar(files.len());
        let config = &self.config;
        let gathered = files
            .par_iter()
            .map(|path| -> Result<Gathered, String> {
                let block = read_block_file(path)?;
                let mut part = Gathered {
                    records_read: block.records.len(),
                    malformed: block.skipped,
                    ..Gathered::default()
                };
                for record in block.records {
                    if !config.id_filter.accepts(&record.id) {
                        part.filtered += 1;
                        continue;
                    }
                    if !is_sampled(self.hasher, config.seed, &record.id, config.sample_ratio) {
                        part.sampled_out += 1;
                        continue;
                    }
                    let p = partition_of(self.hasher, config.seed, &record.id, num_partitions);
                    if wanted.contains(&p) {
                        part.by_partition.entry(p).or_default().push(record);
                    }
                }
                pb.inc(1);
                Ok(part)
            })
            .try_reduce(Gathered::default, |a, b| Ok(a.merge(b)))?;
        pb.finish_and_clear();
        Ok(gathered)
    }

    fn process_partition(
        &self,
        partition: usize,
        records: Option<Vec<CodeRecord>>,
        cache: Option<&TokenCache>,
    ) -> Result<PartitionOutcome, String> {
        let config = &self.config;
        let mut rng = partition_rng(config.seed, partition);
        // Drawn before anything else so cached and fresh runs share the pair RNG stream
        let shuffle_seed: u64 = rng.gen();

        let from_cache = records.is_none();
        let documents: Vec<CodePair> = match records {
            None => {
                let loaded = match cache {
                    Some(cache) => cache
                        .load(partition)
                        .map_err(|e| format!("{}; rerun with --force-recompute", e))?,
                    None => None,
                };
                loaded.ok_or_else(|| {
                    format!(
                        "Token cache for partition {} is no longer usable; rerun with --force-recompute",
                        partition
                    )
                })?
            }
            Some(mut records) => {
                records.sort_by(|a, b| a.id.cmp(&b.id));
                records.shuffle(&mut StdRng::seed_from_u64(shuffle_seed));
                let documents = to_code_pairs(&records, self.tokenizer)
                    .map_err(|e| format!("Failed to tokenize partition {}: {}", partition, e))?;
                if let Some(cache) = cache {
                    if let Err(e) = cache.save(partition, &documents) {
                        self.warn(&format!("Could not cache partition {}: {}", partition, e));
                    }
                }
                documents
            }
        };

        let instances = create_partition_pairs(
            &documents,
            &config.pairs,
            config.duplicate_factor,
            self.tokenizer.vocab_words(),
            &mut rng,
        );
        let summary = write_partition(
            &config.sink,
            partition,
            &instances,
            config.output_format,
            config.bins.as_ref(),
            config.pairs.masking,
        )
        .map_err(|e| format!("Failed to write partition {}: {}", partition, e))?;

        Ok(PartitionOutcome {
            cached: from_cache,
            documents: documents.len(),
            instances: instances.len(),
            files: summary.files.len(),
        })
    }

    /// Run the whole pipeline for this rank
    pub fn run(&self) -> Result<PipelineSummary, String> {
        let start = Instant::now();
        let config = &self.config;

        let files = list_block_files(&config.source)?;
        if files.is_empty() {
            return Err(format!("No .txt block files found in '{}'", config.source.display()));
        }
        let num_partitions = config.partitioning.num_partitions(&files)?;
        let owned = self.world.owned_partitions(num_partitions);
        self.log(&format!(
            "📂 {} input files → {} partitions ({} per rank, {} ranks)",
            files.len(),
            num_partitions,
            owned.len(),
            self.world.size
        ));
        if owned.is_empty() {
            self.warn(&format!("No partitions to process (only {} partitions)", num_partitions));
        }

        let cache = self.open_cache(&files, num_partitions)?;
        let missing: BTreeSet<usize> = owned
            .iter()
            .copied()
            .filter(|&p| match &cache {
                Some(cache) if !config.force_recompute => match cache.state(p) {
                    CacheState::Ready => false,
                    CacheState::Missing => true,
                    CacheState::Stale(reason) => {
                        self.warn(&format!("Ignoring token cache of partition {}: {}", p, reason));
                        true
                    }
                },
                _ => true,
            })
            .collect();
        if cache.is_some() {
            self.log(&format!(
                "💾 Token cache: {} of {} owned partitions reusable",
                owned.len() - missing.len(),
                owned.len()
            ));
        }

        let mut gathered = if missing.is_empty() {
            Gathered::default()
        } else {
            self.log("📖 Reading source blocks...");
            self.gather(&files, num_partitions, &missing)?
        };
        if gathered.malformed > 0 {
            self.warn(&format!("Skipped {} malformed records", gathered.malformed));
        }

        let work: Vec<(usize, Option<Vec<CodeRecord>>)> = owned
            .iter()
            .map(|&p| {
                let records = if missing.contains(&p) {
                    Some(gathered.by_partition.remove(&p).unwrap_or_default())
                } else {
                    None
                };
                (p, records)
            })
            .collect();

        self.log("⚙️  Building pretraining instances...");
        let pb = self.progress_bar(work.len());
        let cached_count = AtomicUsize::new(0);
        let outcomes: Vec<PartitionOutcome> = work
            .into_par_iter()
            .map(|(p, records)| {
                let outcome = self.process_partition(p, records, cache.as_ref())?;
                if outcome.cached {
                    cached_count.fetch_add(1, Ordering::Relaxed);
                }
                pb.inc(1);
                Ok(outcome)
            })
            .collect::<Result<_, String>>()?;
        pb.finish_and_clear();

        let summary = PipelineSummary {
            num_partitions,
            owned_partitions: owned.len(),
            cached_partitions: cached_count.into_inner(),
            records_read: gathered.records_read,
            malformed_records: gathered.malformed,
            filtered_records: gathered.filtered,
            sampled_out: gathered.sampled_out,
            documents: outcomes.iter().map(|o| o.documents).sum(),
            instances: outcomes.iter().map(|o| o.instances).sum(),
            files: outcomes.iter().map(|o| o.files).sum(),
        };
        self.log(&format!(
            "✅ {} documents → {} instances in {} files ({:.2}s)",
            summary.documents,
            summary.instances,
            summary.files,
            start.elapsed().as_secs_f64()
        ));
        Ok(summary)
    }
}
