// ============================================================
// Layer 5 — Masked Tensor Helpers
// ============================================================
// Small numeric building blocks shared by the representation
// and output layers. Every helper takes the float padding mask
// (1.0 = real token, 0.0 = padding) produced by the batcher.
//
// Padded positions are pushed to a large negative score before
// any max or softmax, so they can never win or take mass.

use burn::{
    prelude::*,
    tensor::activation::softmax,
};

/// Added to scores at padded positions.
const PAD_PENALTY: f64 = 1.0e4;

/// [batch, seq] mask → [batch, seq, 1] additive penalty (0 or -PAD_PENALTY).
fn penalty_3d<B: Backend>(mask: Tensor<B, 2>) -> Tensor<B, 3> {
    mask.unsqueeze_dim::<3>(2).sub_scalar(1.0).mul_scalar(PAD_PENALTY)
}

/// Max over the sequence dimension, ignoring padding.
/// x: [batch, seq, dim] → [batch, dim]
///
/// The reduction runs on the last axis; autodiff backends only
/// route `max_dim` gradients along it.
pub fn masked_max_pool<B: Backend>(x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, _, dim] = x.dims();
    (x + penalty_3d(mask))
        .swap_dims(1, 2)
        .max_dim(2)
        .reshape([batch, dim])
}

/// Mean over the sequence dimension, counting only real tokens.
/// x: [batch, seq, dim] → [batch, dim]
pub fn masked_mean_pool<B: Backend>(x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, _, dim] = x.dims();
    let mask = mask.unsqueeze_dim::<3>(2);
    let total = (x * mask.clone()).sum_dim(1);
    let count = mask.sum_dim(1).clamp_min(1.0);
    (total / count).reshape([batch, dim])
}

/// Softmax over the last dimension of [batch, seq] scores, padding excluded.
pub fn masked_softmax<B: Backend>(scores: Tensor<B, 2>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
    let penalty = mask.sub_scalar(1.0).mul_scalar(PAD_PENALTY);
    softmax(scores + penalty, 1)
}

/// Softmax over keys of [batch, query, key] scores; `mask` marks valid keys.
pub fn masked_key_softmax<B: Backend>(scores: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
    let penalty = mask.unsqueeze_dim::<3>(1).sub_scalar(1.0).mul_scalar(PAD_PENALTY);
    softmax(scores + penalty, 2)
}

/// Reverse every row of x: [batch, seq, dim] within its own length.
///
/// Real tokens `0..len` come back as `len-1..=0`; padded positions
/// stay where they are. Applying it twice is the identity.
pub fn reverse_padded<B: Backend>(x: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
    let [batch, seq, dim] = x.dims();
    if seq == 0 {
        return x;
    }
    let device = x.device();

    let positions = Tensor::<B, 1, Int>::arange(0..seq as i64, &device)
        .reshape([1, seq])
        .repeat_dim(0, batch);
    let lens = mask.sum_dim(1).int().repeat_dim(1, seq);
    let reversed = lens.clone().sub_scalar(1) - positions.clone();
    let index = positions.clone().mask_where(positions.lower(lens), reversed);

    x.gather(1, index.unsqueeze_dim::<3>(2).repeat_dim(2, dim))
}

/// Numerically stable log(sum(exp(x))) along `dim`, keeping the dimension.
///
/// The shift is a detached constant, so the gradient flows through
/// `exp` and `log` only.
pub fn log_sum_exp<B: Backend, const D: usize>(x: Tensor<B, D>, dim: usize) -> Tensor<B, D> {
    let max = x.clone().detach().max_dim(dim);
    (x - max.clone()).exp().sum_dim(dim).log() + max
}
