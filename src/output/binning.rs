// binning.rs - Sequence-length bins

use crate::core::pairs::PairInstance;

/// Bins of width `bin_size` covering `1..=target_seq_length`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinSpec {
    pub bin_size: usize,
    pub nbins: usize,
}

impl BinSpec {
    pub fn new(bin_size: usize, target_seq_length: usize) -> Result<Self, String> {
        if bin_size == 0 {
            return Err("Bin size must be greater than zero".to_string());
        }
        if bin_size > target_seq_length {
            return Err("Please provide a bin size that is <= target-seq-length".to_string());
        }
        if target_seq_length % bin_size != 0 {
            return Err(
                "Please provide a bin size that can divide the target sequence length.".to_string(),
            );
        }
        Ok(Self {
            bin_size,
            nbins: target_seq_length / bin_size,
        })
    }

    /// Bin of a sequence; `1..=bin_size` is bin 0
    pub fn bin_id(&self, num_tokens: usize) -> usize {
        (num_tokens.saturating_sub(1) / self.bin_size).min(self.nbins - 1)
    }

    /// Group instances by bin, preserving order inside each bin
    pub fn split<'a>(&self, instances: &'a [PairInstance]) -> Vec<Vec<&'a PairInstance>> {
        let mut bins: Vec<Vec<&PairInstance>> = vec![Vec::new(); self.nbins];
        for instance in instances {
            bins[self.bin_id(instance.num_tokens as usize)].push(instance);
        }
        bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(num_tokens: u16) -> PairInstance {
        PairInstance {
            id: format!("go_{}", num_tokens),
            doc: String::new(),
            code: String::new(),
            num_tokens,
            masked: None,
        }
    }

    #[test]
    fn test_bin_boundaries() {
        let bin_spec = BinSpec::new(32, 128).unwrap();
        assert_eq!(bin_spec.nbins, 4);
        assert_eq!(bin_spec.bin_id(1), 0);
        assert_eq!(bin_spec.bin_id(32), 0);
        assert_eq!(bin_spec.bin_id(33), 1);
        assert_eq!(bin_spec.bin_id(96), 2);
        assert_eq!(bin_spec.bin_id(128), 3);
        assert_eq!(bin_spec.bin_id(500), 3);
    }

    #[test]
    fn test_invalid_bin_sizes() {
        assert!(BinSpec::new(0, 128).is_err());
        assert!(BinSpec::new(256, 128).is_err());
        assert!(BinSpec::new(48, 128).is_err());
        assert!(BinSpec::new(128, 128).is_ok());
    }

    #[test]
    fn test_split_by_bin() {
        let bin_spec = BinSpec::new(64, 128).unwrap();
        let instances = vec![instance(10), instance(100), instance(64), instance(65)];
        let bins = bin_spec.split(&instances);
        let ids: Vec<Vec<u16>> = bins
            .iter()
            .map(|b| b.iter().map(|i| i.num_tokens).collect())
            .collect();
        assert_eq!(ids, vec![vec![10, 64], vec![100, 65]]);
    }
}
