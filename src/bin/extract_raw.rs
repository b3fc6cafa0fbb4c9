// extract_raw.rs - Extract (id, docstring, code) records from CodeSearchNet definition dumps

use argh::FromArgs;
use codebert_prep::corpus::{extract_languages, write_jsonl_records, DEFAULT_LANGUAGES};
use std::path::Path;
use std::time::Instant;

#[derive(FromArgs)]
/// extract_raw - Combine per-language definition dumps into one JSONL corpus
struct Args {
    /// directory holding {lang}_dedupe_definitions.jsonl[.gz]
    #[argh(option)]
    input_dir: String,

    /// output JSONL file
    #[argh(option)]
    output: String,

    /// language to extract, repeatable (default: python java javascript go php ruby)
    #[argh(option)]
    language: Vec<String>,
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

    let languages: Vec<String> = if args.language.is_empty() {
        DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect()
    } else {
        args.language
    };

    let (records, stats) = extract_languages(Path::new(&args.input_dir), &languages)?;
    let written = write_jsonl_records(Path::new(&args.output), &records)?;

    let bimodal: usize = stats.iter().map(|s| s.bimodal).sum();
    println!(
        "✅ Wrote {} records ({} bimodal, {} unimodal) to {} in {:.2}s",
        written,
        bimodal,
        written - bimodal,
        args.output,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
