// split_raw.rs - Split per-language definitions into train/valid/test

use argh::FromArgs;
use codebert_prep::corpus::extract::{definitions_path, load_definitions};
use codebert_prep::corpus::split::{load_split_fingerprints, split_files};
use codebert_prep::corpus::{assign_splits, write_jsonl_records, SPLIT_KEYS, SPLIT_LANGUAGES};
use codebert_prep::hashers::HasherRegistry;
use std::path::Path;

#[derive(FromArgs)]
/// split_raw - Route definitions to the official CodeSearchNet splits by code fingerprint
struct Args {
    /// directory holding {lang}_dedupe_definitions.jsonl[.gz]
    #[argh(option)]
    definitions_dir: String,

    /// root of the official split files ({lang}/final/jsonl/{split}/*.jsonl.gz)
    #[argh(option)]
    splits_dir: String,

    /// output directory for {lang}_{split}.jsonl
    #[argh(option)]
    outdir: String,

    /// language to split, repeatable (default: go java javascript python php ruby)
    #[argh(option)]
    language: Vec<String>,

    /// code fingerprint hasher: crc32, sha256, md5 (default: sha256)
    #[argh(option, default = "String::from(\"sha256\")")]
    hasher_type: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Args = argh::from_env();

    let registry = HasherRegistry::new();
    let hasher = registry.get_hasher(&args.hasher_type).ok_or_else(|| {
        format!(
            "Invalid hasher type '{}'. Available: {}",
            args.hasher_type,
            registry.get_hasher_names().join(", ")
        )
    })?;

    let languages: Vec<String> = if args.language.is_empty() {
        SPLIT_LANGUAGES
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        args.language
    };

    let definitions_dir = Path::new(&args.definitions_dir);
    let splits_dir = Path::new(&args.splits_dir);
    let outdir = Path::new(&args.outdir);

    for language in &languages {
        println!("✂️  Start split {}", language);
        let records = load_definitions(&definitions_path(definitions_dir, language)?, language)?;

        let valid = load_split_fingerprints(&split_files(splits_dir, language, "valid")?, hasher)?;
        let test = load_split_fingerprints(&split_files(splits_dir, language, "test")?, hasher)?;
        let assignment = assign_splits(&records, &valid, &test, hasher);

        for split in SPLIT_KEYS {
            let records = assignment.get(split).unwrap_or_default();
            let path = outdir.join(format!("{}_{}.jsonl", language, split));
            let written = write_jsonl_records(&path, records)?;
            println!("   {} {}: {} records → {}", language, split, written, path.display());
        }
    }
    println!("✅ Split {} languages", languages.len());
    Ok(())
}
