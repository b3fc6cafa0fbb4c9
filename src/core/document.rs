// document.rs - Tokenized sentences, documents and code/docstring pairs

use crate::corpus::CodeRecord;
use crate::tokenize::SubwordTokenizer;
use serde::{Deserialize, Serialize};

/// Tokens of one non-empty source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    tokens: Vec<String>,
}

impl Sentence {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Ordered sentences of one text field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    sentences: Vec<Sentence>,
}

impl Document {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }
}

/// A function split into code sentences and docstring segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePair {
    pub id: String,
    pub codes: Document,
    pub docstrings: Document,
}

impl CodePair {
    pub fn new(id: impl Into<String>, codes: Document, docstrings: Document) -> Self {
        Self {
            id: id.into(),
            codes,
            docstrings,
        }
    }

    /// Number of code sentences
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn code_sentence(&self, idx: usize) -> &Sentence {
        &self.codes.sentences()[idx]
    }

    pub fn doc_segment(&self, idx: usize) -> &Sentence {
        &self.docstrings.sentences()[idx]
    }

    pub fn num_doc_segments(&self) -> usize {
        self.docstrings.len()
    }
}

/// Stripped, non-empty lines of a text field
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|line| !line.is_empty())
}

fn tokenize_field(text: &str, tokenizer: &dyn SubwordTokenizer) -> Result<Document, String> {
    let mut sentences = Vec::new();
    for line in split_lines(text) {
        let tokens = tokenizer.tokenize(line)?;
        if !tokens.is_empty() {
            sentences.push(Sentence::new(tokens));
        }
    }
    Ok(Document::new(sentences))
}

/// Tokenize a raw record line by line
pub fn to_code_pair(record: &CodeRecord, tokenizer: &dyn SubwordTokenizer) -> Result<CodePair, String> {
    let docstrings = tokenize_field(&record.docstring, tokenizer)
        .map_err(|e| format!("Record '{}': {}", record.id, e))?;
    let codes = tokenize_field(&record.code, tokenizer)
        .map_err(|e| format!("Record '{}': {}", record.id, e))?;
    Ok(CodePair::new(record.id.clone(), codes, docstrings))
}

/// Tokenize a batch of records, dropping pairs without code sentences
pub fn to_code_pairs(
    records: &[CodeRecord],
    tokenizer: &dyn SubwordTokenizer,
) -> Result<Vec<CodePair>, String> {
    let mut pairs = Vec::with_capacity(records.len());
    for record in records {
        let pair = to_code_pair(record, tokenizer)?;
        if !pair.is_empty() {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Whitespace tokenizer for tests that do not need real subwords
    pub(crate) struct WhitespaceTokenizer {
        pub vocab: Vec<String>,
    }

    impl WhitespaceTokenizer {
        pub fn new() -> Self {
            Self {
                vocab: ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "x", "y", "z"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }
        }
    }

    impl SubwordTokenizer for WhitespaceTokenizer {
        fn tokenize(&self, text: &str) -> Result<Vec<String>, String> {
            Ok(text.split_whitespace().map(|s| s.to_string()).collect())
        }

        fn vocab_words(&self) -> &[String] {
            &self.vocab
        }
    }

    pub(crate) fn sentence(tokens: &[&str]) -> Sentence {
        Sentence::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_split_lines_strips_and_drops_blank() {
        let lines: Vec<_> = split_lines("  def f():\n\n    pass  \n \t\n").collect();
        assert_eq!(lines, vec!["def f():", "pass"]);
    }

    #[test]
    fn test_to_code_pair() {
        let tokenizer = WhitespaceTokenizer::new();
        let record = CodeRecord::new("python_7", "Do a thing.\n\nReturns x", "def f():\n    return x\n");
        let pair = to_code_pair(&record, &tokenizer).unwrap();

        assert_eq!(pair.id, "python_7");
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.num_doc_segments(), 2);
        assert_eq!(pair.code_sentence(1).tokens(), &["return".to_string(), "x".to_string()]);
        assert_eq!(pair.doc_segment(0).len(), 3);
    }

    #[test]
    fn test_empty_code_pairs_are_dropped() {
        let tokenizer = WhitespaceTokenizer::new();
        let records = vec![
            CodeRecord::new("go_0", "only docs", "   \n"),
            CodeRecord::new("go_1", "", "x"),
        ];
        let pairs = to_code_pairs(&records, &tokenizer).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].id, "go_1");
        assert_eq!(pairs[0].num_doc_segments(), 0);
    }
}
