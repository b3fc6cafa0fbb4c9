// extract.rs - Pull (id, docstring, code) records out of CodeSearchNet definition dumps

use super::record::{open_text, CodeRecord};
use serde::Deserialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};

pub const DEFAULT_LANGUAGES: [&str; 6] = ["python", "java", "javascript", "go", "php", "ruby"];

/// One entry of a `{lang}_dedupe_definitions` dump
#[derive(Debug, Deserialize)]
struct Definition {
    function: String,
    #[serde(default)]
    docstring: Option<String>,
}

/// Per-language extraction counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageStats {
    pub language: String,
    pub total: usize,
    pub bimodal: usize,
    pub unimodal: usize,
}

/// Locate the definitions dump of a language (gzipped or plain)
pub fn definitions_path(dir: &Path, language: &str) -> Result<PathBuf, String> {
    for name in [
        format!("{}_dedupe_definitions.jsonl.gz", language),
        format!("{}_dedupe_definitions.jsonl", language),
    ] {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(format!(
        "No definitions dump for '{}' in '{}' (expected {}_dedupe_definitions.jsonl[.gz])",
        language,
        dir.display(),
        language
    ))
}

/// Load the definitions of one language, numbering ids `{lang}_{i}` in file order
pub fn load_definitions(path: &Path, language: &str) -> Result<Vec<CodeRecord>, String> {
    let reader = open_text(path)?;
    let mut records = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            format!("Failed to read line {} of '{}': {}", line_num + 1, path.display(), e)
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let def: Definition = serde_json::from_str(&line).map_err(|e| {
            format!("Invalid definition at line {} of '{}': {}", line_num + 1, path.display(), e)
        })?;
        let id = format!("{}_{}", language, records.len());
        records.push(CodeRecord::new(id, def.docstring.unwrap_or_default(), def.function));
    }
    Ok(records)
}

/// Count bimodal and unimodal records
pub fn language_stats(language: &str, records: &[CodeRecord]) -> LanguageStats {
    let bimodal = records.iter().filter(|r| r.is_bimodal()).count();
    LanguageStats {
        language: language.to_string(),
        total: records.len(),
        bimodal,
        unimodal: records.len() - bimodal,
    }
}

/// Extract all requested languages, in order
pub fn extract_languages(
    dir: &Path,
    languages: &[String],
) -> Result<(Vec<CodeRecord>, Vec<LanguageStats>), String> {
    let mut all = Vec::new();
    let mut stats = Vec::new();
    for language in languages {
        println!("📦 Extracting {}", language);
        let path = definitions_path(dir, language)?;
        let records = load_definitions(&path, language)?;
        let lang_stats = language_stats(language, &records);
        println!(
            "   {}, bimodal data: {}, unimodal data: {}",
            language, lang_stats.bimodal, lang_stats.unimodal
        );
        stats.push(lang_stats);
        all.extend(records);
    }
    Ok((all, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_gz(path: &Path, content: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(content.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    #[test]
    fn test_extract_counts_and_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_gz(
            &dir.path().join("go_dedupe_definitions.jsonl.gz"),
            "{\"function\":\"func a(){}\",\"docstring\":\"A does a.\"}\n\
             {\"function\":\"func b(){}\",\"docstring\":\"\"}\n\
             {\"function\":\"func c(){}\",\"docstring\":null}\n",
        );
        std::fs::write(
            dir.path().join("ruby_dedupe_definitions.jsonl"),
            "{\"function\":\"def x; end\",\"docstring\":\"X\"}\n",
        )
        .unwrap();

        let langs = vec!["go".to_string(), "ruby".to_string()];
        let (records, stats) = extract_languages(dir.path(), &langs).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[2].id, "go_2");
        assert_eq!(records[3].id, "ruby_0");
        assert_eq!(
            stats[0],
            LanguageStats { language: "go".into(), total: 3, bimodal: 1, unimodal: 2 }
        );
        assert_eq!(stats[1].bimodal, 1);
    }

    #[test]
    fn test_missing_language_dump() {
        let dir = tempfile::tempdir().unwrap();
        assert!(definitions_path(dir.path(), "php").is_err());
    }
}
