// tokenizer.rs - Subword tokenizer loading on top of the `tokenizers` crate

use std::path::{Path, PathBuf};
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::Tokenizer;

/// Where `train_codebert_tokenizer` leaves its vocabulary
pub const DEFAULT_VOCAB_PATH: &str = "codebert_tokenizer/vocab.txt";

/// Lines are truncated to this many subword tokens
pub const MAX_TOKENIZE_LENGTH: usize = 512;

pub const UNK_TOKEN: &str = "[UNK]";

/// Anything that turns a line of text into subword tokens
pub trait SubwordTokenizer: Send + Sync {
    /// Tokens of `text` without special tokens
    fn tokenize(&self, text: &str) -> Result<Vec<String>, String>;

    /// Vocabulary ordered by token id
    fn vocab_words(&self) -> &[String];

    /// Stable fingerprint of the vocabulary
    fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for word in self.vocab_words() {
            hasher.update(word.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize()
    }
}

/// Tokenizer backed by a HuggingFace tokenizer definition or a WordPiece vocab
pub struct HfTokenizer {
    inner: Tokenizer,
    vocab_words: Vec<String>,
    max_length: usize,
    source: PathBuf,
}

impl HfTokenizer {
    /// Load from a `tokenizer.json`, a `vocab.txt`, or a directory holding either
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let resolved = resolve_tokenizer_path(path)?;
        let is_json = resolved.extension().and_then(|s| s.to_str()) == Some("json");
        let path_str = resolved
            .to_str()
            .ok_or_else(|| format!("Tokenizer path '{}' is not valid UTF-8", resolved.display()))?;

        let inner = if is_json {
            Tokenizer::from_file(path_str)
                .map_err(|e| format!("Failed to load tokenizer '{}': {}", resolved.display(), e))?
        } else {
            let model = WordPiece::from_file(path_str)
                .unk_token(UNK_TOKEN.to_string())
                .build()
                .map_err(|e| format!("Failed to load vocab file '{}': {}", resolved.display(), e))?;
            let mut tokenizer = Tokenizer::new(model);
            tokenizer.with_normalizer(BertNormalizer::default());
            tokenizer.with_pre_tokenizer(BertPreTokenizer);
            tokenizer
        };

        let mut vocab: Vec<(String, u32)> = inner.get_vocab(false).into_iter().collect();
        if vocab.is_empty() {
            return Err(format!("Tokenizer '{}' has an empty vocabulary", resolved.display()));
        }
        vocab.sort_by_key(|(_, id)| *id);
        let vocab_words = vocab.into_iter().map(|(word, _)| word).collect();

        Ok(Self {
            inner,
            vocab_words,
            max_length: MAX_TOKENIZE_LENGTH,
            source: resolved,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl SubwordTokenizer for HfTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, String> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| format!("Tokenization failed: {}", e))?;
        let mut tokens = encoding.get_tokens().to_vec();
        tokens.truncate(self.max_length);
        Ok(tokens)
    }

    fn vocab_words(&self) -> &[String] {
        &self.vocab_words
    }
}

/// Pick the concrete file for a tokenizer path
fn resolve_tokenizer_path(path: &Path) -> Result<PathBuf, String> {
    if path.is_dir() {
        for name in ["tokenizer.json", "vocab.txt"] {
            let candidate = path.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        return Err(format!(
            "Directory '{}' contains neither tokenizer.json nor vocab.txt",
            path.display()
        ));
    }
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    Err(format!("Tokenizer path '{}' does not exist", path.display()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_VOCAB: &[&str] = &[
        "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "def", "return", "add", "a", "b", "+", "(",
        ")", ":", ",", "x", "##s", "sum", "numbers", "two", ".", "func", "{", "}",
    ];

    pub(crate) fn write_test_vocab(dir: &Path) -> PathBuf {
        let path = dir.join("vocab.txt");
        std::fs::write(&path, TEST_VOCAB.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_wordpiece_tokenization() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = HfTokenizer::from_path(&write_test_vocab(dir.path())).unwrap();

        let tokens = tokenizer.tokenize("def add(a, b):").unwrap();
        assert_eq!(tokens, vec!["def", "add", "(", "a", ",", "b", ")", ":"]);

        let tokens = tokenizer.tokenize("Return sums").unwrap();
        assert_eq!(tokens, vec!["return", "sum", "##s"]);

        let tokens = tokenizer.tokenize("zzz").unwrap();
        assert_eq!(tokens, vec![UNK_TOKEN]);
    }

    #[test]
    fn test_vocab_order_and_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = write_test_vocab(dir.path());
        let tokenizer = HfTokenizer::from_path(dir.path()).unwrap();
        assert_eq!(tokenizer.source(), vocab.as_path());
        assert_eq!(tokenizer.vocab_words()[0], "[PAD]");
        assert_eq!(tokenizer.vocab_words().len(), TEST_VOCAB.len());

        let again = HfTokenizer::from_path(&vocab).unwrap();
        assert_eq!(tokenizer.fingerprint(), again.fingerprint());
    }

    #[test]
    fn test_max_length_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = HfTokenizer::from_path(&write_test_vocab(dir.path())).unwrap();
        let text = "a b ".repeat(MAX_TOKENIZE_LENGTH);
        let tokens = tokenizer.tokenize(&text).unwrap();
        assert_eq!(tokens.len(), MAX_TOKENIZE_LENGTH);
        assert_eq!(tokens[0], "a");
        assert_eq!(tokens[1], "b");
    }

    #[test]
    fn test_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(HfTokenizer::from_path(&dir.path().join("nope.txt")).is_err());
        assert!(HfTokenizer::from_path(dir.path()).is_err());
    }
}
