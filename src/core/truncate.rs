// truncate.rs - Token sequence truncation strategies

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How over-long token sequences are shortened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationMode {
    /// Drop from the front or the back with equal probability, token by token
    Random,
    /// Always drop from the back
    Tail,
}

impl FromStr for TruncationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(TruncationMode::Random),
            "tail" => Ok(TruncationMode::Tail),
            _ => Err(format!("Invalid truncation mode '{}'. Use: random, tail", s)),
        }
    }
}

impl TruncationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TruncationMode::Random => "random",
            TruncationMode::Tail => "tail",
        }
    }

    pub fn apply<R: Rng>(&self, tokens: &mut Vec<String>, max_num_tokens: usize, rng: &mut R) {
        match self {
            TruncationMode::Random => truncate_seq(tokens, max_num_tokens, rng),
            TruncationMode::Tail => truncate_seq_tail(tokens, max_num_tokens),
        }
    }
}

/// Randomly trim the front or the back until the sequence fits
pub fn truncate_seq<R: Rng>(tokens: &mut Vec<String>, max_num_tokens: usize, rng: &mut R) {
    while tokens.len() > max_num_tokens {
        if rng.gen::<f64>() < 0.5 {
            tokens.remove(0);
        } else {
            tokens.pop();
        }
    }
}

pub fn truncate_seq_tail(tokens: &mut Vec<String>, max_num_tokens: usize) {
    tokens.truncate(max_num_tokens);
}

/// Trim the longer of two sequences, one token at a time, until their sum fits
pub fn truncate_seq_pair<R: Rng>(
    tokens_a: &mut Vec<String>,
    tokens_b: &mut Vec<String>,
    max_num_tokens: usize,
    rng: &mut R,
) {
    while tokens_a.len() + tokens_b.len() > max_num_tokens {
        let trunc = if tokens_a.len() > tokens_b.len() {
            &mut *tokens_a
        } else {
            &mut *tokens_b
        };
        if rng.gen::<f64>() < 0.5 {
            trunc.remove(0);
        } else {
            trunc.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tokens(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_random_truncation_keeps_contiguous_window() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seq = tokens(50);
        truncate_seq(&mut seq, 20, &mut rng);
        assert_eq!(seq.len(), 20);

        let first: usize = seq[0].parse().unwrap();
        for (offset, tok) in seq.iter().enumerate() {
            assert_eq!(tok.parse::<usize>().unwrap(), first + offset);
        }
    }

    #[test]
    fn test_short_sequences_untouched() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seq = tokens(5);
        truncate_seq(&mut seq, 5, &mut rng);
        assert_eq!(seq, tokens(5));
    }

    #[test]
    fn test_tail_truncation() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut seq = tokens(10);
        TruncationMode::Tail.apply(&mut seq, 4, &mut rng);
        assert_eq!(seq, tokens(4));

        let mut empty = tokens(3);
        truncate_seq_tail(&mut empty, 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_pair_truncation_trims_longer_side() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut a = tokens(30);
        let mut b = tokens(4);
        truncate_seq_pair(&mut a, &mut b, 20, &mut rng);
        assert_eq!(a.len() + b.len(), 20);
        assert_eq!(b, tokens(4));

        let mut a = tokens(12);
        let mut b = tokens(12);
        truncate_seq_pair(&mut a, &mut b, 10, &mut rng);
        assert_eq!(a.len(), 5);
        assert_eq!(b.len(), 5);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Random".parse::<TruncationMode>(), Ok(TruncationMode::Random));
        assert_eq!("tail".parse::<TruncationMode>(), Ok(TruncationMode::Tail));
        assert!("middle".parse::<TruncationMode>().is_err());
    }
}
