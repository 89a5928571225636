// ============================================================
// Layer 4 — Joint Batches
// ============================================================
// Turns a Vec<JointSample> into padded tensors the model reads.
//
// Sequences in a batch may differ in length. Tokens and slot
// labels are right-padded up to the longest sequence with the
// vocabularies' padding ids (0 when none is declared), and a
// float mask records which positions are real:
//
//   seq_lens = [3, 1]   →   mask = [[1, 1, 1],
//                                   [1, 0, 0]]
//
// Every masked computation downstream (attention pooling,
// token loss, CRF, Viterbi) reads this mask, never the padding
// ids themselves.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// One labelled utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointSample {
    /// Token ids, one per word
    pub tokens: Vec<u32>,

    /// Dense feature values, when the run declares a dense group
    pub dense: Option<Vec<f32>>,

    /// Document (intent) label id
    pub intent: usize,

    /// Word (slot) label ids, one per token
    pub slots: Vec<usize>,
}

/// Model inputs for one batch.
#[derive(Debug, Clone)]
pub struct JointInput<B: Backend> {
    /// Token ids — shape: [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// 1.0 for real tokens, 0.0 for padding — shape: [batch_size, seq_len]
    pub mask: Tensor<B, 2>,

    /// Unpadded length of each sequence
    pub seq_lens: Vec<usize>,

    /// Dense features — shape: [batch_size, dense_dim]
    pub dense: Option<Tensor<B, 2>>,
}

impl<B: Backend> JointInput<B> {
    /// Wrap a padded token tensor; the mask is derived from `seq_lens`.
    pub fn new(tokens: Tensor<B, 2, Int>, seq_lens: Vec<usize>) -> Self {
        let [_, seq_len] = tokens.dims();
        let mask = padding_mask::<B>(&seq_lens, seq_len, &tokens.device());
        Self { tokens, mask, seq_lens, dense: None }
    }

    pub fn with_dense(mut self, dense: Tensor<B, 2>) -> Self {
        self.dense = Some(dense);
        self
    }
}

/// Gold labels for one batch.
#[derive(Debug, Clone)]
pub struct JointTargets<B: Backend> {
    /// Intent ids — shape: [batch_size]
    pub doc_labels: Tensor<B, 1, Int>,

    /// Slot ids, padded with the slot pad id — shape: [batch_size, seq_len]
    pub word_labels: Tensor<B, 2, Int>,
}

#[derive(Debug, Clone)]
pub struct JointBatch<B: Backend> {
    pub input:   JointInput<B>,
    pub targets: JointTargets<B>,
}

/// Build a [batch, seq_len] float mask from sequence lengths.
pub fn padding_mask<B: Backend>(
    seq_lens: &[usize],
    seq_len:  usize,
    device:   &B::Device,
) -> Tensor<B, 2> {
    let flat: Vec<f32> = seq_lens
        .iter()
        .flat_map(|&len| (0..seq_len).map(move |pos| if pos < len { 1.0 } else { 0.0 }))
        .collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([seq_lens.len(), seq_len])
}

/// Pads samples into a [`JointBatch`] on one device.
#[derive(Clone, Debug)]
pub struct JointBatcher<B: Backend> {
    pub device:    B::Device,
    /// Token id written past the end of a sequence
    pub token_pad: u32,
    /// Slot label id written past the end of a sequence
    pub slot_pad:  usize,
}

impl<B: Backend> JointBatcher<B> {
    /// Batcher that pads tokens and slot labels with 0.
    pub fn new(device: B::Device) -> Self {
        Self { device, token_pad: 0, slot_pad: 0 }
    }

    /// Pad with the token and slot vocabularies' own padding ids.
    pub fn with_padding(mut self, token_pad: u32, slot_pad: usize) -> Self {
        self.token_pad = token_pad;
        self.slot_pad = slot_pad;
        self
    }
}

impl<B: Backend> Batcher<JointSample, JointBatch<B>> for JointBatcher<B> {
    /// Right-pad every sample to the longest one. Slot lists longer
    /// than their tokens are cut; dense rows are truncated or
    /// zero-filled to the first declared width.
    fn batch(&self, items: Vec<JointSample>) -> JointBatch<B> {
        let batch_size = items.len();
        let seq_lens: Vec<usize> = items.iter().map(|s| s.tokens.len()).collect();
        let seq_len = seq_lens.iter().copied().max().unwrap_or(0);

        // ── Pad tokens and slot labels to the longest sequence ───────────────
        let token_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| {
                let pad = seq_len - s.tokens.len();
                s.tokens
                    .iter()
                    .map(|&t| t as i32)
                    .chain(std::iter::repeat(self.token_pad as i32).take(pad))
            })
            .collect();

        let slot_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| {
                let pad = seq_len - s.slots.len().min(seq_len);
                s.slots
                    .iter()
                    .take(seq_len)
                    .map(|&l| l as i32)
                    .chain(std::iter::repeat(self.slot_pad as i32).take(pad))
            })
            .collect();

        let intents: Vec<i32> = items.iter().map(|s| s.intent as i32).collect();

        let tokens = Tensor::<B, 1, Int>::from_ints(token_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let word_labels = Tensor::<B, 1, Int>::from_ints(slot_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let doc_labels = Tensor::<B, 1, Int>::from_ints(intents.as_slice(), &self.device);

        // ── Dense features: rows missing a vector are zero-filled ────────────
        let dense_dim = items.iter().find_map(|s| s.dense.as_ref().map(Vec::len));
        let dense = dense_dim.map(|dim| {
            let flat: Vec<f32> = items
                .iter()
                .flat_map(|s| match &s.dense {
                    Some(values) => values.iter().copied().chain(std::iter::repeat(0.0)).take(dim).collect::<Vec<_>>(),
                    None => vec![0.0; dim],
                })
                .collect();
            Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([batch_size, dim])
        });

        let mut input = JointInput::new(tokens, seq_lens);
        input.dense = dense;

        JointBatch {
            input,
            targets: JointTargets { doc_labels, word_labels },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn sample(tokens: Vec<u32>, intent: usize) -> JointSample {
        let slots = vec![1; tokens.len()];
        JointSample { tokens, dense: None, intent, slots }
    }

    #[test]
    fn test_mask_follows_sequence_lengths() {
        let device = Default::default();
        let mask = padding_mask::<TestBackend>(&[3, 1], 3, &device);
        let values = mask.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_batch_pads_to_longest_sequence() {
        let batcher = JointBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample(vec![5, 6, 7, 8], 0), sample(vec![9], 1)]);

        assert_eq!(batch.input.tokens.dims(), [2, 4]);
        assert_eq!(batch.targets.word_labels.dims(), [2, 4]);
        assert_eq!(batch.targets.doc_labels.dims(), [2]);
        assert_eq!(batch.input.seq_lens, vec![4, 1]);
        assert!(batch.input.dense.is_none());

        let tokens = batch.input.tokens.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(tokens, vec![5, 6, 7, 8, 9, 0, 0, 0]);
    }

    #[test]
    fn test_dense_rows_are_stacked() {
        let batcher = JointBatcher::<TestBackend>::new(Default::default());
        let mut a = sample(vec![1, 2], 0);
        a.dense = Some(vec![0.5, 1.5, 2.5]);
        let b = sample(vec![3], 1);

        let batch = batcher.batch(vec![a, b]);
        let dense = batch.input.dense.expect("dense features");
        assert_eq!(dense.dims(), [2, 3]);
        let values = dense.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![0.5, 1.5, 2.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_declared_pad_ids_fill_the_tail() {
        let batcher = JointBatcher::<TestBackend>::new(Default::default()).with_padding(99, 4);
        let batch = batcher.batch(vec![sample(vec![5, 6, 7], 0), sample(vec![8], 1)]);

        let tokens = batch.input.tokens.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(tokens, vec![5, 6, 7, 8, 99, 99]);
        let slots = batch.targets.word_labels.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(slots, vec![1, 1, 1, 1, 4, 4]);
        assert_eq!(batch.input.seq_lens, vec![3, 1]);
    }

    #[test]
    fn test_empty_sample_is_all_padding() {
        let batcher = JointBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample(vec![], 0), sample(vec![3, 4], 1)]);
        assert_eq!(batch.input.seq_lens, vec![0, 2]);
        let mask = batch.input.mask.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(mask, vec![0.0, 0.0, 1.0, 1.0]);
    }
}
