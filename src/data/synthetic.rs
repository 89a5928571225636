// ============================================================
// Layer 4 — Synthetic Samples
// ============================================================
// Random but well-formed samples for smoke-testing an assembled
// model: every id stays inside its vocabulary, every sequence
// has at least one token, and dense vectors match the declared
// width.

use rand::Rng;

use crate::data::batch::JointSample;

/// Shape of the random samples to draw.
#[derive(Debug, Clone)]
pub struct SyntheticShape {
    pub word_vocab:  usize,
    pub doc_labels:  usize,
    pub word_labels: usize,
    pub max_seq_len: usize,
    pub dense_dim:   usize,
}

/// Draw `count` random samples with lengths in `1..=max_seq_len`.
pub fn synthetic_samples<R: Rng>(rng: &mut R, shape: &SyntheticShape, count: usize) -> Vec<JointSample> {
    let max_len = shape.max_seq_len.max(1);
    (0..count)
        .map(|_| {
            let len    = rng.gen_range(1..=max_len);
            let tokens = (0..len).map(|_| rng.gen_range(0..shape.word_vocab) as u32).collect();
            let slots  = (0..len).map(|_| rng.gen_range(0..shape.word_labels)).collect();
            let dense  = (shape.dense_dim > 0)
                .then(|| (0..shape.dense_dim).map(|_| rng.gen_range(-1.0..1.0)).collect());
            JointSample {
                tokens,
                dense,
                intent: rng.gen_range(0..shape.doc_labels),
                slots,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_samples_respect_vocabularies() {
        let mut rng = StdRng::seed_from_u64(7);
        let shape = SyntheticShape {
            word_vocab: 20, doc_labels: 3, word_labels: 5, max_seq_len: 6, dense_dim: 4,
        };
        let samples = synthetic_samples(&mut rng, &shape, 32);

        assert_eq!(samples.len(), 32);
        for s in &samples {
            assert!(!s.tokens.is_empty() && s.tokens.len() <= 6);
            assert_eq!(s.tokens.len(), s.slots.len());
            assert!(s.tokens.iter().all(|&t| (t as usize) < 20));
            assert!(s.slots.iter().all(|&l| l < 5));
            assert!(s.intent < 3);
            assert_eq!(s.dense.as_ref().map(Vec::len), Some(4));
        }
    }

    #[test]
    fn test_no_dense_when_width_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let shape = SyntheticShape {
            word_vocab: 5, doc_labels: 2, word_labels: 2, max_seq_len: 3, dense_dim: 0,
        };
        assert!(synthetic_samples(&mut rng, &shape, 4).iter().all(|s| s.dense.is_none()));
    }
}
