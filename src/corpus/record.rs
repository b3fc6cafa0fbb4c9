// record.rs - Raw code records and the source block text format

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Records in a source block are separated by CRLF; code keeps bare LF
pub const RECORD_DELIMITER: &str = "\r\n";

/// Separates the docstring from the code inside one record
pub const DOCSTRING_SEPARATOR: char = '\u{1f}';

/// One function from the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub id: String,
    #[serde(default)]
    pub docstring: String,
    pub code: String,
}

impl CodeRecord {
    pub fn new(id: impl Into<String>, docstring: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            docstring: docstring.into(),
            code: code.into(),
        }
    }

    /// A record is bimodal when it carries a non-blank docstring
    pub fn is_bimodal(&self) -> bool {
        !self.docstring.trim().is_empty()
    }

    /// Render the record as one block entry (without the trailing delimiter)
    pub fn to_block_record(&self, with_docstring: bool) -> String {
        let id: String = self
            .id
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        let code = self.code.replace(RECORD_DELIMITER, "\n");

        let docstring = if with_docstring {
            self.docstring
                .replace(RECORD_DELIMITER, "\n")
                .replace(DOCSTRING_SEPARATOR, " ")
        } else {
            String::new()
        };

        if !docstring.is_empty() || code.contains(DOCSTRING_SEPARATOR) {
            format!("{} {}{}{}", id, docstring, DOCSTRING_SEPARATOR, code)
        } else {
            format!("{} {}", id, code)
        }
    }

    /// Parse one block entry; `None` for entries without an id or body
    pub fn parse_block_record(raw: &str) -> Option<Self> {
        let raw = raw.trim_start();
        let (id, rest) = raw.split_once(' ')?;
        if id.is_empty() {
            return None;
        }
        let (docstring, code) = match rest.split_once(DOCSTRING_SEPARATOR) {
            Some((doc, code)) => (doc, code),
            None => ("", rest),
        };
        Some(Self::new(id, docstring, code))
    }
}

/// Open a plain or gzip-compressed text file for line reading
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    let is_gz = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read a JSON-lines file of records
pub fn read_jsonl_records(path: &Path) -> Result<Vec<CodeRecord>, String> {
    let reader = open_text(path)?;
    let mut records = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            format!("Failed to read line {} of '{}': {}", line_num + 1, path.display(), e)
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record: CodeRecord = serde_json::from_str(&line).map_err(|e| {
            format!("Invalid record at line {} of '{}': {}", line_num + 1, path.display(), e)
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write records as JSON lines
pub fn write_jsonl_records<'a, I>(path: &Path, records: I) -> Result<usize, String>
where
    I: IntoIterator<Item = &'a CodeRecord>,
{
    crate::output::ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    let mut count = 0;
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .map_err(|e| format!("Failed to serialize record '{}': {}", record.id, e))?;
        writeln!(writer).map_err(|e| format!("Write error: {}", e))?;
        count += 1;
    }
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_only_record() {
        let record = CodeRecord::new("go_3", "", "func a() {\n}");
        let line = record.to_block_record(true);
        assert_eq!(line, "go_3 func a() {\n}");
        assert_eq!(CodeRecord::parse_block_record(&line), Some(record));
    }

    #[test]
    fn test_bimodal_record_keeps_docstring() {
        let record = CodeRecord::new("python_0", "Add two numbers.", "def add(a, b):\r\n    return a + b");
        let line = record.to_block_record(true);
        assert!(!line.contains("\r\n"));

        let parsed = CodeRecord::parse_block_record(&line).unwrap();
        assert_eq!(parsed.docstring, "Add two numbers.");
        assert_eq!(parsed.code, "def add(a, b):\n    return a + b");
        assert!(parsed.is_bimodal());
    }

    #[test]
    fn test_docstring_dropped_when_requested() {
        let record = CodeRecord::new("java_1", "Docs", "int x;");
        let line = record.to_block_record(false);
        assert_eq!(line, "java_1 int x;");
    }

    #[test]
    fn test_separator_in_code_survives() {
        let record = CodeRecord::new("php_9", "", "echo \u{1f};");
        let parsed = CodeRecord::parse_block_record(&record.to_block_record(true)).unwrap();
        assert_eq!(parsed.code, "echo \u{1f};");
        assert!(!parsed.is_bimodal());
    }

    #[test]
    fn test_malformed_records() {
        assert_eq!(CodeRecord::parse_block_record("no_space_here"), None);
        assert_eq!(CodeRecord::parse_block_record(""), None);
    }

    #[test]
    fn test_jsonl_roundtrip_with_missing_docstring() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        std::fs::write(&path, "{\"id\":\"ruby_0\",\"code\":\"puts 1\"}\n\n").unwrap();
        let records = read_jsonl_records(&path).unwrap();
        assert_eq!(records, vec![CodeRecord::new("ruby_0", "", "puts 1")]);

        let out = dir.path().join("nested/out.jsonl");
        assert_eq!(write_jsonl_records(&out, &records).unwrap(), 1);
        assert_eq!(read_jsonl_records(&out).unwrap(), records);
    }
}
