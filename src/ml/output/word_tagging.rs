// ============================================================
// Layer 5 — Word Tagging Output (softmax)
// ============================================================
// Independent per-token softmax over slot labels. The loss is the
// token-level cross-entropy averaged over scored tokens: real
// (unmasked) positions whose gold label is not the metadata's pad
// label. Prediction is the per-token argmax trimmed to each
// sequence's length.

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

use crate::domain::error::AssemblyError;
use crate::domain::metadata::FieldMeta;
use crate::ml::output::{classification::smoothing, int_rows};

#[derive(Config, Debug)]
pub struct WordTaggingOutputConfig {
    #[config(default = 0.0)]
    pub label_smoothing: f64,
}

impl WordTaggingOutputConfig {
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if !(0.0..1.0).contains(&self.label_smoothing) {
            return Err(AssemblyError::configuration(
                "word_output",
                format!("label_smoothing must be in [0, 1), got {}", self.label_smoothing),
            ));
        }
        Ok(())
    }

    pub fn init(&self, labels: &FieldMeta) -> WordTaggingOutputLayer {
        WordTaggingOutputLayer {
            num_tags:        labels.vocab_size,
            label_smoothing: self.label_smoothing,
            pad_label:       labels.pad_token_idx,
        }
    }
}

#[derive(Module, Clone, Debug)]
pub struct WordTaggingOutputLayer {
    pub num_tags:        usize,
    pub label_smoothing: f64,
    /// Gold label that marks a position as unscored
    pub pad_label:       Option<usize>,
}

impl WordTaggingOutputLayer {
    /// logits: [batch, seq, tags], labels/mask: [batch, seq] → mean token loss, shape [1]
    ///
    /// Only scored positions reach the loss, so the mean does not
    /// depend on how much padding the batch carries. A batch with no
    /// scored position has loss 0.
    pub fn loss<B: Backend>(
        &self,
        logits: Tensor<B, 3>,
        labels: Tensor<B, 2, Int>,
        mask:   Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let [batch, seq, tags] = logits.dims();
        let device = logits.device();

        let scored = self.scored_positions(labels.clone(), mask);
        if scored.is_empty() {
            return Tensor::zeros([1], &device);
        }
        let index = Tensor::<B, 1, Int>::from_ints(scored.as_slice(), &device);
        let logits = logits.reshape([batch * seq, tags]).select(0, index.clone());
        let labels = labels.reshape([batch * seq]).select(0, index);

        CrossEntropyLossConfig::new()
            .with_smoothing(smoothing(self.label_smoothing))
            .init(&device)
            .forward(logits, labels)
    }

    /// Flat [batch * seq] indices of real tokens not labelled with the pad label.
    fn scored_positions<B: Backend>(&self, labels: Tensor<B, 2, Int>, mask: Tensor<B, 2>) -> Vec<i32> {
        let mask = mask
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .expect("f32 data converts to Vec<f32>");
        let labels = labels
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .expect("i64 data converts to Vec<i64>");
        let pad = self.pad_label.map(|p| p as i64);

        mask.iter()
            .zip(&labels)
            .enumerate()
            .filter(|(_, (&real, &label))| real > 0.0 && Some(label) != pad)
            .map(|(i, _)| i as i32)
            .collect()
    }

    /// logits: [batch, seq, tags] → tag ids per sequence, trimmed to `seq_lens`
    pub fn predict<B: Backend>(&self, logits: Tensor<B, 3>, seq_lens: &[usize]) -> Vec<Vec<usize>> {
        let [batch, seq, _] = logits.dims();
        int_rows(logits.argmax(2).reshape([batch, seq]))
            .into_iter()
            .zip(seq_lens)
            .map(|(mut row, &len)| {
                row.truncate(len);
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use crate::data::batch::padding_mask;

    type TestBackend = NdArray;

    #[test]
    fn test_predictions_are_trimmed_to_length() {
        let device = Default::default();
        let layer = WordTaggingOutputConfig::new().init(&FieldMeta::new(2));
        // [1, 3, 2]: tag 1 wins, then tag 0, then tag 1 (padding)
        let logits = Tensor::<TestBackend, 1>::from_floats(
            [0.0f32, 1.0, 1.0, 0.0, 0.0, 1.0].as_slice(),
            &device,
        )
        .reshape([1, 3, 2]);
        assert_eq!(layer.predict(logits, &[2]), vec![vec![1, 0]]);
    }

    #[test]
    fn test_padding_does_not_change_loss() {
        let device = Default::default();
        let layer = WordTaggingOutputConfig::new().init(&FieldMeta::new(2));
        let values = [2.0f32, -1.0, 0.5, 0.5, -3.0, 3.0];
        let logits = Tensor::<TestBackend, 1>::from_floats(values.as_slice(), &device).reshape([1, 3, 2]);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 0].as_slice(), &device).reshape([1, 3]);

        // Same first two tokens, different garbage in the padded slot
        let mut other = values;
        other[4] = 10.0;
        let logits_other = Tensor::<TestBackend, 1>::from_floats(other.as_slice(), &device).reshape([1, 3, 2]);

        let mask = padding_mask::<TestBackend>(&[2], 3, &device);
        let a: f32 = layer.loss(logits, labels.clone(), mask.clone()).into_scalar().elem();
        let b: f32 = layer.loss(logits_other, labels, mask).into_scalar().elem();
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_pad_label_positions_are_not_scored() {
        let device = Default::default();
        let mut labels_meta = FieldMeta::new(2);
        labels_meta.pad_token_idx = Some(1);
        let layer = WordTaggingOutputConfig::new().init(&labels_meta);

        // Token 0 is gold 0; token 1 carries the pad label and a terrible score
        let logits = Tensor::<TestBackend, 1>::from_floats([3.0f32, 0.0, 9.0, -9.0].as_slice(), &device)
            .reshape([1, 2, 2]);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 1].as_slice(), &device).reshape([1, 2]);
        let mask = padding_mask::<TestBackend>(&[2], 2, &device);

        let loss: f32 = layer.loss(logits, labels, mask).into_scalar().elem();
        let expected = (1.0f32 + (-3.0f32).exp()).ln();
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_empty_sequences_give_zero_loss() {
        let device = Default::default();
        let layer = WordTaggingOutputConfig::new().init(&FieldMeta::new(3));
        let logits = Tensor::<TestBackend, 3>::ones([2, 2, 3], &device);
        let labels = Tensor::<TestBackend, 2, Int>::zeros([2, 2], &device);
        let mask = padding_mask::<TestBackend>(&[0, 0], 2, &device);
        let loss: f32 = layer.loss(logits, labels, mask).into_scalar().elem();
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn test_backward_skips_padded_positions() {
        type GradBackend = Autodiff<NdArray>;
        let device = Default::default();
        let layer = WordTaggingOutputConfig::new().with_label_smoothing(0.1).init(&FieldMeta::new(3));
        let logits = Tensor::<GradBackend, 3>::ones([2, 3, 3], &device).require_grad();
        let labels = Tensor::<GradBackend, 2, Int>::zeros([2, 3], &device);
        let mask = padding_mask::<GradBackend>(&[3, 1], 3, &device);

        let grads = layer.loss(logits.clone(), labels, mask).backward();
        let grad = logits.grad(&grads).unwrap();
        let real: f32 = grad.clone().slice([0..1, 0..3, 0..3]).abs().sum().into_scalar().elem();
        let padded: f32 = grad.slice([1..2, 1..3, 0..3]).abs().sum().into_scalar().elem();
        assert!(real > 0.0);
        assert_eq!(padded, 0.0);
    }
}
