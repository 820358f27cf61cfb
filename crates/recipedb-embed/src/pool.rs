use anyhow::Result;
use candle_core::Tensor;

/// Added to the Euclidean norm before dividing.
pub const L2_EPS: f32 = 1e-9;

/// Floor on the count of unmasked positions; a fully padded row pools to
/// zeros instead of NaN.
pub const MIN_VALID_TOKENS: f32 = 1.0;

/// Average `hidden` over the positions where `attention_mask` is 1.
///
/// `hidden` is `[B,T,H]`, `attention_mask` is `[B,T]`; returns `[B,H]`.
/// Padding positions contribute neither to the sum nor to the divisor.
pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (_batch, _time, _hidden_dim) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let sum = (hidden * &mask_3d)?.sum(1)?;
    let floor = Tensor::new(&[MIN_VALID_TOKENS], hidden.device())?.to_dtype(sum.dtype())?;
    let counts = mask.sum_keepdim(1)?.broadcast_maximum(&floor)?;
    Ok(sum.broadcast_div(&counts)?)
}

/// Row-wise `v / (|v| + eps)` on a `[B,H]` tensor.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let eps = Tensor::new(&[L2_EPS], rows.device())?.to_dtype(rows.dtype())?;
    let norm = rows.sqr()?.sum_keepdim(1)?.sqrt()?.broadcast_add(&eps)?;
    Ok(rows.broadcast_div(&norm)?)
}

pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _, hidden_dim) = hidden.dims3()?;
    let pooled = l2_normalize(&masked_mean(hidden, attention_mask)?)?;
    anyhow::ensure!(pooled.dims() == &[batch, hidden_dim], "pooled shape {:?}", pooled.dims());
    Ok(pooled)
}

/// Slice form of [`l2_normalize`] for backends that hand back plain vectors.
pub fn normalize_l2(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt() + L2_EPS;
    for x in &mut v {
        *x /= norm;
    }
    v
}
