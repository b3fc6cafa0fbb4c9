// txt.rs - Plain-text debug output

use crate::core::pairs::PairInstance;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write one `id [CLS] doc [SEP] code [SEP] - n` line per instance
pub fn write_text_lines(path: &Path, instances: &[&PairInstance]) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    for instance in instances {
        writeln!(writer, "{}", instance.to_text_line()).map_err(|e| format!("Write error: {}", e))?;
    }
    writer.flush().map_err(|e| format!("Flush error: {}", e))?;
    Ok(())
}
