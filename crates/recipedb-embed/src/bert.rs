//! Token-pooled BERT-family encoder (e.g. bge-small-en-v1.5) running on candle.
//!
//! The model directory must hold `config.json`, `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin`. Every query is padded to
//! `max_len`, run through the encoder, mean-pooled over unmasked positions
//! and L2-normalized.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use recipedb_core::traits::EmbeddingProvider;
use recipedb_core::Error;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;
use crate::{backend_error, SLOW_EMBED_MS};

/// The two `config.json` fields needed outside the model itself.
#[derive(Deserialize)]
struct Shape {
    hidden_size: usize,
    max_position_embeddings: usize,
}

struct Encoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    pad_id: u32,
    dim: usize,
}

/// Forward passes run on the blocking pool, so the encoder is shared by `Arc`.
pub struct BertEmbedder {
    encoder: Arc<Encoder>,
    id: String,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BERT encoder");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let shape: Shape = serde_json::from_str(&raw)?;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DTYPE, &device);
        let model = BertModel::load(vb, &config)?;

        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);
        let max_len = max_len.min(shape.max_position_embeddings);
        let name = model_dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let id = format!("bert:{}:d{}", name, shape.hidden_size);
        info!(%id, max_len, "BERT encoder ready");
        let encoder = Encoder { model, tokenizer, device, max_len, pad_id, dim: shape.hidden_size };
        Ok(Self { encoder: Arc::new(encoder), id })
    }
}

impl Encoder {
    fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
        let enc = tokenize_on_device(&self.tokenizer, text, self.max_len, self.pad_id, &self.device)?;
        let hidden = self.model.forward(&enc.input_ids, &enc.token_type_ids, Some(&enc.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &enc.attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        anyhow::ensure!(v.len() == self.dim, "encoder produced {} dims, expected {}", v.len(), self.dim);
        Ok(v)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    Err(anyhow!("no model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

#[async_trait]
impl EmbeddingProvider for BertEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.encoder.dim
    }

    async fn embed(&self, text: &str) -> recipedb_core::Result<Vec<f32>> {
        let start = Instant::now();
        let encoder = Arc::clone(&self.encoder);
        let text = text.to_owned();
        let v = tokio::task::spawn_blocking(move || encoder.embed_sync(&text))
            .await
            .map_err(|e| Error::EmbeddingBackend(format!("embedding task failed: {e}")))?
            .map_err(backend_error)?;
        let ms = start.elapsed().as_millis() as u64;
        if ms > SLOW_EMBED_MS { warn!(ms, "slow embedding"); } else { debug!(ms, "embedded query"); }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_model_dir_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let err = BertEmbedder::load(&dir.path().join("absent"), 128).err().unwrap();
        assert!(format!("{err:#}").contains("tokenizer.json"), "{err:#}");
    }

    #[tokio::test(flavor = "current_thread")]
    #[ignore = "requires a bge-small model directory in RECIPEDB_BERT_MODEL"]
    async fn concurrent_embeds_complete_on_a_single_threaded_runtime() {
        let dir = PathBuf::from(std::env::var("RECIPEDB_BERT_MODEL").unwrap());
        let model = BertEmbedder::load(&dir, 128).unwrap();
        let (a, b) = tokio::join!(model.embed("chicken karahi"), model.embed("daal chawal"));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.len(), model.dim());
        let norm: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }
}
