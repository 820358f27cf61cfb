//! Pre-pooled sentence encoder (fastembed). Pooling and normalization happen
//! inside the packaged model; the output is re-normalized so the query-side
//! unit-length guarantee holds regardless of the model variant.
//!
//! Two ways in: a local ONNX export with its tokenizer files
//! ([`SentenceEmbedder::from_files`]), or a named model fetched into a cache
//! directory on first use ([`SentenceEmbedder::new`]).

use async_trait::async_trait;
use fastembed::{
    InitOptions, InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use recipedb_core::traits::EmbeddingProvider;
use recipedb_core::{Error, Result};

use crate::pool::normalize_l2;
use crate::SLOW_EMBED_MS;

/// fastembed's `embed()` takes `&mut self`, hence the mutex. The `Arc` lets
/// inference run on the blocking pool.
pub struct SentenceEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    id: String,
    dim: usize,
}

impl SentenceEmbedder {
    /// Load `model_name`, downloading into `cache_dir` on first use.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self> {
        let model_enum = parse_model_name(model_name)?;
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| Error::Configuration(format!("cannot create {}: {e}", cache_dir.display())))?;
        info!(model = model_name, cache = %cache_dir.display(), "loading sentence encoder");

        let options = InitOptions::new(model_enum)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(true);
        let model = TextEmbedding::try_new(options).map_err(|e| Error::Configuration(e.to_string()))?;
        Self::ready(model, model_name.to_lowercase())
    }

    /// Load a local ONNX export. `tokenizer.json`, `config.json`,
    /// `special_tokens_map.json` and `tokenizer_config.json` are read from
    /// `tokenizer_dir`, or from the model's directory when it is `None`.
    pub fn from_files(model_path: &Path, tokenizer_dir: Option<&Path>, max_len: usize) -> Result<Self> {
        let dir = match tokenizer_dir {
            Some(dir) => dir.to_path_buf(),
            None => model_path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        info!(model = %model_path.display(), tokenizer = %dir.display(), "loading local sentence encoder");

        let onnx = read_artifact(model_path)?;
        let tokenizer_files = TokenizerFiles {
            tokenizer_file: read_artifact(&dir.join("tokenizer.json"))?,
            config_file: read_artifact(&dir.join("config.json"))?,
            special_tokens_map_file: read_artifact(&dir.join("special_tokens_map.json"))?,
            tokenizer_config_file: read_artifact(&dir.join("tokenizer_config.json"))?,
        };
        let user_model = UserDefinedEmbeddingModel::new(onnx, tokenizer_files).with_pooling(Pooling::Mean);
        let options = InitOptionsUserDefined::new().with_max_length(max_len);
        let model = TextEmbedding::try_new_from_user_defined(user_model, options)
            .map_err(|e| Error::Configuration(format!("cannot load {}: {e}", model_path.display())))?;

        let name = model_path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::ready(model, format!("local-{name}"))
    }

    fn ready(mut model: TextEmbedding, label: String) -> Result<Self> {
        let dim = model
            .embed(vec!["dimension check"], None)
            .map_err(|e| Error::Configuration(format!("failed to read model dimensions: {e}")))?
            .first()
            .map(Vec::len)
            .ok_or_else(|| Error::Configuration("model returned no embedding".into()))?;

        let id = format!("sentence:{label}:d{dim}");
        info!(%id, "sentence encoder ready");
        Ok(Self { model: Arc::new(Mutex::new(model)), id, dim })
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Configuration(format!("cannot read {}: {e}", path.display())))
}

fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l6-v2-q" | "allminiml6v2q" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q),
        "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-small-en-v1.5-q" | "bgesmallenv15q" => Ok(fastembed::EmbeddingModel::BGESmallENV15Q),
        "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        _ => Err(Error::Configuration(format!(
            "unknown sentence model '{name}'; supported: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (add -q for quantized where available), or set embedding.sentence.model_path"
        ))),
    }
}

#[async_trait]
impl EmbeddingProvider for SentenceEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let model = Arc::clone(&self.model);
        let text = text.to_owned();
        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| Error::EmbeddingBackend(format!("model lock poisoned: {e}")))?;
            model.embed(vec![text], None).map_err(|e| Error::EmbeddingBackend(e.to_string()))
        })
        .await
        .map_err(|e| Error::EmbeddingBackend(format!("embedding task failed: {e}")))??;
        let v = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingBackend("no embedding returned".into()))?;
        let ms = start.elapsed().as_millis() as u64;
        if ms > SLOW_EMBED_MS { warn!(ms, "slow embedding"); } else { debug!(ms, "embedded query"); }
        Ok(normalize_l2(v))
    }
}
