// masking.rs - Static masked-LM prediction selection

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const MASK_TOKEN: &str = "[MASK]";

/// Masked positions (in the `[CLS] a [SEP] b [SEP]` sequence) and their original tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedLm {
    pub positions: Vec<u16>,
    pub labels: Vec<String>,
}

/// Result of masking one pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedPair {
    pub tokens_a: Vec<String>,
    pub tokens_b: Vec<String>,
    pub masked: MaskedLm,
}

/// Round half to even
pub(crate) fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        rounded
    }
}

/// Choose and replace masked-LM targets.
///
/// The sequence is `[CLS] a [SEP] b [SEP]`, or `[CLS] b [SEP]` when `a` is
/// empty. `max(1, round(len * ratio))` non-special positions are picked; each
/// becomes `[MASK]` 80% of the time, stays unchanged 10% of the time and is
/// replaced by a random vocabulary word otherwise.
pub fn create_masked_lm_predictions<R: Rng>(
    tokens_a: &[String],
    tokens_b: &[String],
    masked_lm_ratio: f64,
    vocab_words: &[String],
    rng: &mut R,
) -> MaskedPair {
    let num_a = tokens_a.len();
    let num_b = tokens_b.len();

    let mut tokens = Vec::with_capacity(num_a + num_b + 3);
    tokens.push(CLS_TOKEN.to_string());
    if num_a > 0 {
        tokens.extend_from_slice(tokens_a);
        tokens.push(SEP_TOKEN.to_string());
    }
    tokens.extend_from_slice(tokens_b);
    tokens.push(SEP_TOKEN.to_string());

    let b_start = 1 + num_a + usize::from(num_a > 0);

    let mut cand_indexes: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.as_str() != CLS_TOKEN && t.as_str() != SEP_TOKEN)
        .map(|(i, _)| i)
        .collect();
    cand_indexes.shuffle(rng);

    let num_to_predict = (round_half_even(tokens.len() as f64 * masked_lm_ratio) as usize).max(1);

    let mut output_tokens = tokens.clone();
    let mut chosen: Vec<usize> = Vec::with_capacity(num_to_predict);
    for index in cand_indexes.into_iter().take(num_to_predict) {
        let replacement = if rng.gen::<f64>() < 0.8 {
            MASK_TOKEN.to_string()
        } else if rng.gen::<f64>() < 0.5 || vocab_words.is_empty() {
            tokens[index].clone()
        } else {
            vocab_words[rng.gen_range(0..vocab_words.len())].clone()
        };
        output_tokens[index] = replacement;
        chosen.push(index);
    }
    chosen.sort_unstable();

    let masked = MaskedLm {
        positions: chosen.iter().map(|&i| i as u16).collect(),
        labels: chosen.iter().map(|&i| tokens[i].clone()).collect(),
    };

    MaskedPair {
        tokens_a: output_tokens[1..1 + num_a].to_vec(),
        tokens_b: output_tokens[b_start..b_start + num_b].to_vec(),
        masked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(0.5), 0.0);
        assert_eq!(round_half_even(1.5), 2.0);
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(2.4), 2.0);
        assert_eq!(round_half_even(2.6), 3.0);
    }

    #[test]
    fn test_masking_with_docstring() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = words("adds two numbers");
        let b = words("def add ( a , b ) : return a + b");
        let vocab = words("x y z");

        let out = create_masked_lm_predictions(&a, &b, 0.15, &vocab, &mut rng);
        // 3 + 12 + 3 special = 18 tokens; round(2.7) = 3
        assert_eq!(out.masked.positions.len(), 3);
        assert_eq!(out.masked.labels.len(), 3);
        assert_eq!(out.tokens_a.len(), a.len());
        assert_eq!(out.tokens_b.len(), b.len());

        let mut full = vec![CLS_TOKEN.to_string()];
        full.extend(a.clone());
        full.push(SEP_TOKEN.to_string());
        full.extend(b.clone());
        full.push(SEP_TOKEN.to_string());

        let sep_a = a.len() + 1;
        assert!(out.masked.positions.windows(2).all(|w| w[0] < w[1]));
        for (pos, label) in out.masked.positions.iter().zip(&out.masked.labels) {
            let pos = *pos as usize;
            assert!(pos != 0 && pos != sep_a && pos != full.len() - 1);
            assert_eq!(&full[pos], label);
        }
    }

    #[test]
    fn test_masking_without_docstring_aligns_code() {
        let mut rng = StdRng::seed_from_u64(5);
        let b = words("a b c d e f g h");
        let out = create_masked_lm_predictions(&[], &b, 0.0, &[], &mut rng);

        // At least one position is always masked
        assert_eq!(out.masked.positions.len(), 1);
        assert!(out.tokens_a.is_empty());
        assert_eq!(out.tokens_b.len(), b.len());

        let pos = out.masked.positions[0] as usize;
        assert!((1..=b.len()).contains(&pos));
        assert_eq!(out.masked.labels[0], b[pos - 1]);
        for (i, tok) in out.tokens_b.iter().enumerate() {
            if i + 1 != pos {
                assert_eq!(tok, &b[i]);
            }
        }
    }

    #[test]
    fn test_full_ratio_masks_every_candidate() {
        let mut rng = StdRng::seed_from_u64(9);
        let a = words("p q");
        let b = words("r s t");
        let out = create_masked_lm_predictions(&a, &b, 1.0, &words("x"), &mut rng);
        assert_eq!(out.masked.positions, vec![1, 2, 4, 5, 6]);
        assert_eq!(out.masked.labels, words("p q r s t"));
    }
}
