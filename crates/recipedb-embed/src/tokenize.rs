use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Model inputs for a single sequence, each shaped `[1, max_len]`.
pub struct Encoded {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Truncate or right-pad ids and mask to exactly `max_len` positions.
/// Padded positions get `pad_id` and mask 0.
pub fn pad_to(mut ids: Vec<u32>, mut mask: Vec<u32>, max_len: usize, pad_id: u32) -> (Vec<u32>, Vec<u32>) {
    ids.truncate(max_len);
    mask.truncate(max_len);
    ids.resize(max_len, pad_id);
    mask.resize(max_len, 0);
    (ids, mask)
}

pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, pad_id: u32, device: &Device) -> Result<Encoded> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let (ids, mask) = pad_to(enc.get_ids().to_vec(), enc.get_attention_mask().to_vec(), max_len, pad_id);
    let input_ids = Tensor::from_iter(ids, device)?.reshape((1, max_len))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((1, max_len))?;
    let token_type_ids = input_ids.zeros_like()?;
    Ok(Encoded { input_ids, attention_mask, token_type_ids })
}
