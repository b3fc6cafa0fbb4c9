// pairs.rs - Build `[CLS] doc [SEP] code [SEP]` instances from tokenized functions

use crate::core::document::{CodePair, Sentence};
use crate::core::masking::{create_masked_lm_predictions, MaskedLm};
use crate::core::truncate::TruncationMode;
use rand::seq::SliceRandom;
use rand::Rng;

/// Follow-up instances of one function need at least this many code tokens
pub const MIN_FOLLOWUP_CODE_TOKENS: usize = 16;

/// Settings for instance creation
#[derive(Debug, Clone)]
pub struct PairConfig {
    pub max_seq_length: usize,
    pub short_seq_prob: f64,
    pub masking: bool,
    pub masked_lm_ratio: f64,
    pub truncation: TruncationMode,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            max_seq_length: 128,
            short_seq_prob: 0.1,
            masking: false,
            masked_lm_ratio: 0.15,
            truncation: TruncationMode::Random,
        }
    }
}

/// One pretraining instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairInstance {
    pub id: String,
    pub doc: String,
    pub code: String,
    pub num_tokens: u16,
    pub masked: Option<MaskedLm>,
}

impl PairInstance {
    /// Debug text rendering used by the txt output format
    pub fn to_text_line(&self) -> String {
        format!(
            "{} [CLS] {} [SEP] {} [SEP] - {}",
            self.id, self.doc, self.code, self.num_tokens
        )
    }
}

/// Docstring token budget for a given sequence length
pub fn max_doc_seq_length(max_seq_length: usize) -> usize {
    if max_seq_length >= 512 {
        64
    } else {
        32
    }
}

fn concat_tokens(chunk: &[&Sentence]) -> Vec<String> {
    chunk.iter().flat_map(|s| s.tokens().iter().cloned()).collect()
}

/// Pick the docstring tokens that accompany every instance of a function
fn select_doc_tokens<R: Rng>(
    document: &CodePair,
    max_doc: usize,
    use_first_segment: bool,
    truncation: TruncationMode,
    rng: &mut R,
) -> Vec<String> {
    let num_segments = document.num_doc_segments();
    let mut doc_tokens = Vec::new();
    if num_segments == 0 {
        return doc_tokens;
    }

    if use_first_segment {
        doc_tokens.extend_from_slice(document.doc_segment(0).tokens());
    } else {
        let mut chunk: Vec<&Sentence> = Vec::new();
        let mut current_length = 0;
        for i in 0..num_segments {
            let segment = document.doc_segment(i);
            chunk.push(segment);
            current_length += segment.len();
            if i == num_segments - 1 || current_length > max_doc {
                let end = if current_length > max_doc && chunk.len() > 1 {
                    chunk.len() - 1
                } else {
                    chunk.len()
                };
                doc_tokens = concat_tokens(&chunk[..end]);
                break;
            }
        }
    }

    truncation.apply(&mut doc_tokens, max_doc, rng);
    doc_tokens
}

/// Create all instances of one function.
///
/// The docstring is chosen once and paired with consecutive windows of code
/// sentences. A window closes when it overflows the token budget; its last
/// sentence then also opens the next window.
pub fn create_pairs_from_document<R: Rng>(
    document: &CodePair,
    config: &PairConfig,
    vocab_words: &[String],
    rng: &mut R,
) -> Vec<PairInstance> {
    let has_doc = document.num_doc_segments() > 0;
    // [CLS], [SEP], [SEP] with a docstring, else [CLS], [SEP]
    let special_token_length = if has_doc { 3 } else { 2 };
    let max_num_tokens = config.max_seq_length.saturating_sub(special_token_length);
    if max_num_tokens == 0 || document.is_empty() {
        return Vec::new();
    }

    // Leave room for at least one code token
    let max_doc = max_doc_seq_length(config.max_seq_length).min(max_num_tokens - 1);

    let short_seq_p = rng.gen::<f64>();
    let doc_tokens = select_doc_tokens(
        document,
        max_doc,
        short_seq_p < config.short_seq_prob,
        config.truncation,
        rng,
    );
    let doc_length = doc_tokens.len();
    let code_budget = max_num_tokens - doc_length;

    let mut instances = Vec::new();
    let mut chunk: Vec<&Sentence> = Vec::new();
    let mut current_length = doc_length;
    let last = document.len() - 1;

    for i in 0..document.len() {
        let segment = document.code_sentence(i);
        chunk.push(segment);
        current_length += segment.len();

        if i == last || current_length > max_num_tokens {
            let carry_last = current_length > max_num_tokens && chunk.len() > 1;

            let mut code_tokens = concat_tokens(&chunk);
            config.truncation.apply(&mut code_tokens, code_budget, rng);

            if instances.is_empty() || code_tokens.len() >= MIN_FOLLOWUP_CODE_TOKENS {
                instances.push(build_instance(document, &doc_tokens, code_tokens, special_token_length, config, vocab_words, rng));
            }

            chunk = if carry_last {
                chunk.last().copied().into_iter().collect()
            } else {
                Vec::new()
            };
            current_length = chunk.iter().map(|s| s.len()).sum::<usize>() + doc_length;
        }
    }

    instances
}

fn build_instance<R: Rng>(
    document: &CodePair,
    doc_tokens: &[String],
    code_tokens: Vec<String>,
    special_token_length: usize,
    config: &PairConfig,
    vocab_words: &[String],
    rng: &mut R,
) -> PairInstance {
    let total = doc_tokens.len() + code_tokens.len() + special_token_length;
    let num_tokens = u16::try_from(total).unwrap_or(u16::MAX);

    if config.masking {
        let masked = create_masked_lm_predictions(
            doc_tokens,
            &code_tokens,
            config.masked_lm_ratio,
            vocab_words,
            rng,
        );
        PairInstance {
            id: document.id.clone(),
            doc: masked.tokens_a.join(" "),
            code: masked.tokens_b.join(" "),
            num_tokens,
            masked: Some(masked.masked),
        }
    } else {
        PairInstance {
            id: document.id.clone(),
            doc: doc_tokens.join(" "),
            code: code_tokens.join(" "),
            num_tokens,
            masked: None,
        }
    }
}

/// Create instances for a whole partition, `duplicate_factor` times over, then shuffle
pub fn create_partition_pairs<R: Rng>(
    documents: &[CodePair],
    config: &PairConfig,
    duplicate_factor: usize,
    vocab_words: &[String],
    rng: &mut R,
) -> Vec<PairInstance> {
    let mut pairs = Vec::new();
    for _ in 0..duplicate_factor {
        for document in documents {
            pairs.extend(create_pairs_from_document(document, config, vocab_words, rng));
        }
    }
    pairs.shuffle(rng);
    pairs
}
