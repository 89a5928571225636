// ============================================================
// Layer 5 — CRF Output
// ============================================================
// Linear-chain conditional random field over slot labels.
//
// Learned parameters:
//   transitions [tags, tags]  score of moving from tag i to tag j
//   start       [tags]        score of opening a sequence with tag j
//   end         [tags]        score of closing a sequence with tag j
//
// Loss: negative log-likelihood of the gold tag path,
//   log Z(x) - score(x, y)
// with log Z computed by the forward algorithm over real tokens.
//
// Prediction: Viterbi decoding, run on the host over the
// emission scores pulled out of the tensor.
//
// These parameters are only read by `loss` and `decode`, never
// by the model's forward pass. That is what
// `excluded_from_forward_graph` reports to the assembler.
//
// Reference: Lafferty et al. (2001) Conditional Random Fields
//            Lample et al. (2016) Neural Architectures for NER

use burn::{
    module::Param,
    prelude::*,
    tensor::Distribution,
};

use crate::domain::error::AssemblyError;
use crate::domain::metadata::FieldMeta;
use crate::ml::ops::log_sum_exp;

#[derive(Config, Debug)]
pub struct CrfOutputConfig {
    /// Transition scores start uniform in [-init_scale, init_scale]
    #[config(default = 0.1)]
    pub init_scale: f64,
}

impl CrfOutputConfig {
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.init_scale.is_nan() || self.init_scale <= 0.0 {
            return Err(AssemblyError::configuration(
                "word_output",
                format!("init_scale must be > 0, got {}", self.init_scale),
            ));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, labels: &FieldMeta, device: &B::Device) -> CrfOutputLayer<B> {
        let num_tags = labels.vocab_size;
        let dist = Distribution::Uniform(-self.init_scale, self.init_scale);
        CrfOutputLayer {
            transitions: Param::from_tensor(Tensor::random([num_tags, num_tags], dist, device)),
            start:       Param::from_tensor(Tensor::random([num_tags], dist, device)),
            end:         Param::from_tensor(Tensor::random([num_tags], dist, device)),
            num_tags,
        }
    }
}

#[derive(Module, Debug)]
pub struct CrfOutputLayer<B: Backend> {
    pub transitions: Param<Tensor<B, 2>>,
    pub start:       Param<Tensor<B, 1>>,
    pub end:         Param<Tensor<B, 1>>,
    pub num_tags:    usize,
}

impl<B: Backend> CrfOutputLayer<B> {
    /// emissions: [batch, seq, tags] → log Z per sequence, [batch]
    fn log_partition(&self, emissions: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 1> {
        let [batch, seq, tags] = emissions.dims();
        let transitions = self.transitions.val().unsqueeze::<3>(); // [1, from, to]

        let first = emissions.clone().slice([0..batch, 0..1, 0..tags]).reshape([batch, tags]);
        let mut alpha = first + self.start.val().unsqueeze::<2>();

        for i in 1..seq {
            let emit = emissions.clone().slice([0..batch, i..i + 1, 0..tags]); // [batch, 1, to]
            let scores = alpha.clone().unsqueeze_dim::<3>(2) + transitions.clone() + emit;
            let next = log_sum_exp(scores, 1).reshape([batch, tags]);
            // Padded steps carry alpha through unchanged
            let step = mask.clone().slice([0..batch, i..i + 1]);
            alpha = next * step.clone() + alpha * step.neg().add_scalar(1.0);
        }

        log_sum_exp(alpha + self.end.val().unsqueeze::<2>(), 1).reshape([batch])
    }

    /// Score of the gold path per sequence, [batch]. Empty sequences score 0.
    fn path_score(
        &self,
        emissions: Tensor<B, 3>,
        tags:      Tensor<B, 2, Int>,
        mask:      Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let [batch, seq, num_tags] = emissions.dims();
        let lens = mask.clone().sum_dim(1); // [batch, 1]
        let has_tokens = lens.clone().clamp_max(1.0).reshape([batch]);

        let emitted = emissions
            .gather(2, tags.clone().unsqueeze_dim::<3>(2))
            .reshape([batch, seq]);
        let emitted = (emitted * mask.clone()).sum_dim(1).reshape([batch]);

        let first_tags = tags.clone().slice([0..batch, 0..1]).reshape([batch]);
        let started = self.start.val().select(0, first_tags) * has_tokens.clone();

        let moved = if seq > 1 {
            let from = tags.clone().slice([0..batch, 0..seq - 1]);
            let to = tags.clone().slice([0..batch, 1..seq]);
            let flat = (from.mul_scalar(num_tags as i64) + to).reshape([batch * (seq - 1)]);
            let scores = self
                .transitions
                .val()
                .reshape([num_tags * num_tags])
                .select(0, flat)
                .reshape([batch, seq - 1]);
            (scores * mask.slice([0..batch, 1..seq])).sum_dim(1).reshape([batch])
        } else {
            Tensor::zeros([batch], &emitted.device())
        };

        let last_index = lens.int().sub_scalar(1).clamp_min(0); // [batch, 1]
        let last_tags = tags.gather(1, last_index).reshape([batch]);
        let ended = self.end.val().select(0, last_tags) * has_tokens;

        emitted + started + moved + ended
    }

    /// Mean negative log-likelihood of the gold paths, shape [1].
    ///
    /// Sequences without real tokens contribute nothing and are not
    /// counted in the mean.
    pub fn loss(
        &self,
        emissions: Tensor<B, 3>,
        tags:      Tensor<B, 2, Int>,
        mask:      Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let [batch, seq, _] = emissions.dims();
        if seq == 0 {
            return Tensor::zeros([1], &emissions.device());
        }
        let has_tokens = mask.clone().sum_dim(1).clamp_max(1.0).reshape([batch]);
        let log_z = self.log_partition(emissions.clone(), mask.clone());
        let gold = self.path_score(emissions, tags, mask);
        ((log_z - gold) * has_tokens.clone()).sum() / has_tokens.sum().clamp_min(1.0)
    }

    /// Highest-scoring tag path per sequence, trimmed to `seq_lens`.
    pub fn decode(&self, emissions: Tensor<B, 3>, seq_lens: &[usize]) -> Vec<Vec<usize>> {
        let [batch, seq, tags] = emissions.dims();
        let emissions = float_values(emissions);
        let transitions = float_values(self.transitions.val());
        let start = float_values(self.start.val());
        let end = float_values(self.end.val());

        (0..batch)
            .map(|b| {
                let len = seq_lens.get(b).copied().unwrap_or(seq).min(seq);
                let row = &emissions[b * seq * tags..(b * seq + len) * tags];
                viterbi(row, tags, &transitions, &start, &end)
            })
            .collect()
    }

    /// CRF parameters are not touched by the ordinary forward pass.
    pub fn excluded_from_forward_graph(&self) -> bool {
        true
    }
}

fn float_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f32> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .expect("f32 data converts to Vec<f32>")
}

/// Best path through `emissions` ([len * tags], row-major).
pub fn viterbi(
    emissions:   &[f32],
    tags:        usize,
    transitions: &[f32],
    start:       &[f32],
    end:         &[f32],
) -> Vec<usize> {
    let len = emissions.len() / tags.max(1);
    if len == 0 {
        return Vec::new();
    }

    let mut score: Vec<f32> = (0..tags).map(|j| start[j] + emissions[j]).collect();
    let mut backpointers: Vec<Vec<usize>> = Vec::with_capacity(len - 1);

    for i in 1..len {
        let emit = &emissions[i * tags..(i + 1) * tags];
        let mut next = vec![f32::NEG_INFINITY; tags];
        let mut from = vec![0usize; tags];
        for to in 0..tags {
            for prev in 0..tags {
                let candidate = score[prev] + transitions[prev * tags + to];
                if candidate > next[to] {
                    next[to] = candidate;
                    from[to] = prev;
                }
            }
            next[to] += emit[to];
        }
        score = next;
        backpointers.push(from);
    }

    let (mut best, _) = score
        .iter()
        .zip(end)
        .map(|(s, e)| s + e)
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |acc, (j, s)| if s > acc.1 { (j, s) } else { acc });

    let mut path = vec![best; len];
    for (i, from) in backpointers.iter().enumerate().rev() {
        best = from[best];
        path[i] = best;
    }
    path
}
