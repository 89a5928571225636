// ============================================================
// Layer 5 — Document Classification Output
// ============================================================
// Intent head: softmax cross-entropy over the doc logits, argmax
// for prediction. Optional label smoothing mixes the gold-label
// NLL with the mean NLL over all labels:
//
//   loss = (1 - ε) * -log p(gold) + ε * mean_c(-log p(c))

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

use crate::domain::error::AssemblyError;
use crate::domain::metadata::FieldMeta;
use crate::ml::output::int_rows;

#[derive(Config, Debug)]
pub struct ClassificationOutputConfig {
    #[config(default = 0.0)]
    pub label_smoothing: f64,
}

impl ClassificationOutputConfig {
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if !(0.0..1.0).contains(&self.label_smoothing) {
            return Err(AssemblyError::configuration(
                "doc_output",
                format!("label_smoothing must be in [0, 1), got {}", self.label_smoothing),
            ));
        }
        Ok(())
    }

    pub fn init(&self, labels: &FieldMeta) -> ClassificationOutputLayer {
        ClassificationOutputLayer {
            num_classes:     labels.vocab_size,
            label_smoothing: self.label_smoothing,
        }
    }
}

/// Burn takes smoothing as `Option<f32>`; 0 means none.
pub(crate) fn smoothing(label_smoothing: f64) -> Option<f32> {
    (label_smoothing > 0.0).then_some(label_smoothing as f32)
}

#[derive(Module, Clone, Debug)]
pub struct ClassificationOutputLayer {
    pub num_classes:     usize,
    pub label_smoothing: f64,
}

impl ClassificationOutputLayer {
    /// logits: [batch, classes], labels: [batch] → mean loss, shape [1]
    pub fn loss<B: Backend>(&self, logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        CrossEntropyLossConfig::new()
            .with_smoothing(smoothing(self.label_smoothing))
            .init(&logits.device())
            .forward(logits, labels)
    }

    /// logits: [batch, classes] → predicted class per example
    pub fn predict<B: Backend>(&self, logits: Tensor<B, 2>) -> Vec<usize> {
        let [batch, _] = logits.dims();
        int_rows(logits.argmax(1).reshape([batch, 1]))
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn logits(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        Tensor::<TestBackend, 1>::from_floats([0.0f32, 5.0, 0.0, 4.0, 0.0, 0.0].as_slice(), device)
            .reshape([2, 3])
    }

    #[test]
    fn test_predict_takes_argmax() {
        let device = Default::default();
        let layer = ClassificationOutputConfig::new().init(&FieldMeta::new(3));
        assert_eq!(layer.predict(logits(&device)), vec![1, 0]);
    }

    #[test]
    fn test_loss_is_lower_for_correct_labels() {
        let device = Default::default();
        let layer = ClassificationOutputConfig::new().init(&FieldMeta::new(3));
        let right = Tensor::<TestBackend, 1, Int>::from_ints([1, 0].as_slice(), &device);
        let wrong = Tensor::<TestBackend, 1, Int>::from_ints([2, 2].as_slice(), &device);

        let right: f32 = layer.loss(logits(&device), right).into_scalar().elem();
        let wrong: f32 = layer.loss(logits(&device), wrong).into_scalar().elem();
        assert!(right >= 0.0);
        assert!(right < wrong);
    }

    #[test]
    fn test_smoothing_mixes_gold_and_uniform_targets() {
        let device = Default::default();
        let layer = ClassificationOutputConfig::new().with_label_smoothing(0.1).init(&FieldMeta::new(3));
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([1].as_slice(), &device);
        let logits = Tensor::<TestBackend, 1>::from_floats([0.0f32, 5.0, 0.0].as_slice(), &device).reshape([1, 3]);
        let got: f32 = layer.loss(logits, labels).into_scalar().elem();

        let log_z = (2.0f32 + 5.0f32.exp()).ln();
        let nll = [log_z, log_z - 5.0, log_z];
        let expected = 0.9 * nll[1] + 0.1 * nll.iter().sum::<f32>() / 3.0;
        assert!((got - expected).abs() < 1e-4, "{got} vs {expected}");
    }

    #[test]
    fn test_smoothing_out_of_range_is_rejected() {
        let err = ClassificationOutputConfig::new().with_label_smoothing(1.5).validate().unwrap_err();
        assert!(matches!(err, AssemblyError::Configuration { component: "doc_output", .. }));
    }
}
