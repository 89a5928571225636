// ============================================================
// Layer 5 — BiLSTM Doc/Slot Attention Representation
// ============================================================
// embedded [batch, seq, embed_dim]
//       │
//       ▼
//   stacked BiLSTM (dropout between layers, backward
//   direction reversed within each sequence's length)
//       │  states [batch, seq, 2 * lstm_dim]
//       ├──────────────────────────────┐
//       ▼                              ▼
//   doc pooling                  slot attention (optional)
//   (self-attention / max / mean)  [attended ; states]
//       │                              │
//   doc MLP layers               word MLP layers
//       ▼                              ▼
//   doc  [batch, doc_dim]        word [batch, seq, word_dim]
//
// doc_dim  = 2 * lstm_dim
// word_dim = 2 * lstm_dim, doubled when slot attention is on
//
// Reference: Liu & Lane (2016) Attention-Based RNN Models for
//            Joint Intent Detection and Slot Filling

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig},
    prelude::*,
    tensor::activation::{relu, tanh},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::AssemblyError;
use crate::ml::ops::{
    masked_key_softmax, masked_max_pool, masked_mean_pool, masked_softmax, reverse_padded,
};

const COMPONENT: &str = "representation";

/// How the document vector is pooled from LSTM states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolingConfig {
    SelfAttention { attn_dimension: usize },
    MaxPool,
    MeanPool,
}

/// Scoring used by slot attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotAttentionType {
    /// score(i, j) = h_i · h_j
    Dot,
    /// score(i, j) = h_i W · h_j
    Multiply,
}

#[derive(Config, Debug)]
pub struct BiLstmDocSlotAttentionConfig {
    #[config(default = 0.4)]
    pub dropout: f64,
    #[config(default = 32)]
    pub lstm_dim: usize,
    #[config(default = 1)]
    pub num_layers: usize,
    #[config(default = "PoolingConfig::SelfAttention { attn_dimension: 64 }")]
    pub pooling: PoolingConfig,
    pub slot_attention: Option<SlotAttentionType>,
    #[config(default = 0)]
    pub doc_mlp_layers: usize,
    #[config(default = 0)]
    pub word_mlp_layers: usize,
}

impl BiLstmDocSlotAttentionConfig {
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.lstm_dim == 0 {
            return Err(AssemblyError::configuration(COMPONENT, "lstm_dim must be > 0"));
        }
        if self.num_layers == 0 {
            return Err(AssemblyError::configuration(COMPONENT, "num_layers must be > 0"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(AssemblyError::configuration(
                COMPONENT,
                format!("dropout must be in [0, 1), got {}", self.dropout),
            ));
        }
        if let PoolingConfig::SelfAttention { attn_dimension: 0 } = self.pooling {
            return Err(AssemblyError::configuration(COMPONENT, "attn_dimension must be > 0"));
        }
        Ok(())
    }

    fn lstm_out_dim(&self) -> usize {
        2 * self.lstm_dim
    }

    pub fn doc_representation_dim(&self) -> usize {
        self.lstm_out_dim()
    }

    pub fn word_representation_dim(&self) -> usize {
        match self.slot_attention {
            Some(_) => 2 * self.lstm_out_dim(),
            None => self.lstm_out_dim(),
        }
    }

    pub fn init<B: Backend>(&self, embed_dim: usize, device: &B::Device) -> BiLstmDocSlotAttention<B> {
        let hidden = self.lstm_out_dim();

        let lstms = (0..self.num_layers)
            .map(|layer| {
                let d_input = if layer == 0 { embed_dim } else { hidden };
                LengthAwareBiLstm {
                    forward_lstm:  LstmConfig::new(d_input, self.lstm_dim, true).init(device),
                    backward_lstm: LstmConfig::new(d_input, self.lstm_dim, true).init(device),
                }
            })
            .collect();

        let attention = match self.pooling {
            PoolingConfig::SelfAttention { attn_dimension } => Some(SelfAttentionPool {
                projection: LinearConfig::new(hidden, attn_dimension).init(device),
                scorer: LinearConfig::new(attn_dimension, 1).with_bias(false).init(device),
            }),
            _ => None,
        };

        let slot_attention = self.slot_attention.map(|kind| SlotAttention {
            projection: match kind {
                SlotAttentionType::Dot => None,
                SlotAttentionType::Multiply => {
                    Some(LinearConfig::new(hidden, hidden).with_bias(false).init(device))
                }
            },
        });

        let word_dim = self.word_representation_dim();
        BiLstmDocSlotAttention {
            lstms,
            attention,
            mean_pool: self.pooling == PoolingConfig::MeanPool,
            slot_attention,
            doc_mlp: (0..self.doc_mlp_layers)
                .map(|_| LinearConfig::new(hidden, hidden).init(device))
                .collect(),
            word_mlp: (0..self.word_mlp_layers)
                .map(|_| LinearConfig::new(word_dim, word_dim).init(device))
                .collect(),
            dropout: DropoutConfig::new(self.dropout).init(),
            doc_dim: hidden,
            word_dim,
        }
    }
}

/// One bidirectional LSTM layer over right-padded batches.
///
/// The backward direction reads each sequence from its last real
/// token, so padding never flows into real positions.
#[derive(Module, Debug)]
pub struct LengthAwareBiLstm<B: Backend> {
    pub forward_lstm:  Lstm<B>,
    pub backward_lstm: Lstm<B>,
}

impl<B: Backend> LengthAwareBiLstm<B> {
    /// x: [batch, seq, d_input] → [batch, seq, 2 * hidden]
    pub fn forward(&self, x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        let (forward, _) = self.forward_lstm.forward(x.clone(), None);
        let (backward, _) = self
            .backward_lstm
            .forward(reverse_padded(x, mask.clone()), None);
        Tensor::cat(vec![forward, reverse_padded(backward, mask)], 2)
    }
}

/// Additive self-attention pooling: softmax(w · tanh(W h)).
#[derive(Module, Debug)]
pub struct SelfAttentionPool<B: Backend> {
    pub projection: Linear<B>,
    pub scorer:     Linear<B>,
}

impl<B: Backend> SelfAttentionPool<B> {
    /// states: [batch, seq, dim] → [batch, dim]
    pub fn forward(&self, states: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, seq, dim] = states.dims();
        let scores = self
            .scorer
            .forward(tanh(self.projection.forward(states.clone())))
            .reshape([batch, seq]);
        let weights = masked_softmax(scores, mask).unsqueeze_dim::<3>(2);
        (states * weights).sum_dim(1).reshape([batch, dim])
    }
}

/// Attention of every word over every other word of the same sequence.
#[derive(Module, Debug)]
pub struct SlotAttention<B: Backend> {
    /// Present for multiplicative scoring, absent for dot scoring
    pub projection: Option<Linear<B>>,
}

impl<B: Backend> SlotAttention<B> {
    /// states: [batch, seq, dim] → [batch, seq, 2 * dim]
    pub fn forward(&self, states: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        let queries = match &self.projection {
            Some(projection) => projection.forward(states.clone()),
            None => states.clone(),
        };
        let scores = queries.matmul(states.clone().swap_dims(1, 2));
        let weights = masked_key_softmax(scores, mask);
        let attended = weights.matmul(states.clone());
        Tensor::cat(vec![attended, states], 2)
    }
}

#[derive(Module, Debug)]
pub struct BiLstmDocSlotAttention<B: Backend> {
    pub lstms:          Vec<LengthAwareBiLstm<B>>,
    pub attention:      Option<SelfAttentionPool<B>>,
    pub mean_pool:      bool,
    pub slot_attention: Option<SlotAttention<B>>,
    pub doc_mlp:        Vec<Linear<B>>,
    pub word_mlp:       Vec<Linear<B>>,
    pub dropout:        Dropout,
    pub doc_dim:        usize,
    pub word_dim:       usize,
}

impl<B: Backend> BiLstmDocSlotAttention<B> {
    pub fn forward(&self, embedded: Tensor<B, 3>, mask: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let mut states = self.dropout.forward(embedded);
        for lstm in &self.lstms {
            states = self.dropout.forward(lstm.forward(states, mask.clone()));
        }

        // ── Document branch ──────────────────────────────────────────────────
        let mut doc = match (&self.attention, self.mean_pool) {
            (Some(attention), _) => attention.forward(states.clone(), mask.clone()),
            (None, true) => masked_mean_pool(states.clone(), mask.clone()),
            (None, false) => masked_max_pool(states.clone(), mask.clone()),
        };
        for layer in &self.doc_mlp {
            doc = relu(layer.forward(doc));
        }

        // ── Word branch ──────────────────────────────────────────────────────
        let mut word = match &self.slot_attention {
            Some(attention) => attention.forward(states, mask),
            None => states,
        };
        for layer in &self.word_mlp {
            word = relu(layer.forward(word));
        }

        (self.dropout.forward(doc), self.dropout.forward(word))
    }
}
