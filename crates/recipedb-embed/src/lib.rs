//! Embedding backends behind [`recipedb_core::traits::EmbeddingProvider`].
//!
//! - `bert`: token-pooled local inference (candle + tokenizers)
//! - `sentence`: pre-pooled local sentence encoder (fastembed)
//! - `remote`: HTTPS embeddings API (reqwest)
//! - `fake`: deterministic hashing embedder for development and tests
//!
//! All of them return L2-normalized query vectors.

pub mod bert;
pub mod device;
pub mod fake;
pub mod pool;
pub mod remote;
#[cfg(feature = "sentence")]
pub mod sentence;
pub mod tokenize;

use tracing::info;

use recipedb_core::config::{Backend, Config};
use recipedb_core::traits::EmbeddingProvider;
use recipedb_core::{Error, Result};

pub use bert::BertEmbedder;
pub use fake::FakeEmbedder;
pub use pool::{l2_normalize, masked_mean, masked_mean_l2, normalize_l2};
pub use remote::RemoteEmbedder;
#[cfg(feature = "sentence")]
pub use sentence::SentenceEmbedder;

/// Local embeddings slower than this are logged at `warn`.
pub const SLOW_EMBED_MS: u64 = 100;

pub(crate) fn backend_error(e: anyhow::Error) -> Error {
    Error::EmbeddingBackend(format!("{e:#}"))
}

/// Build the provider selected by `embedding.backend`. Loads model
/// artifacts eagerly; the handle is meant to live for the whole process.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn EmbeddingProvider>> {
    let s = &config.settings().embedding;
    info!(backend = %s.backend, "initialising embedding provider");
    match s.backend {
        Backend::Bert => {
            let dir = config.resolve_path(&s.bert.model_dir);
            let model = BertEmbedder::load(&dir, s.bert.max_len)
                .map_err(|e| Error::Configuration(format!("{e:#}")))?;
            Ok(Box::new(model))
        }
        #[cfg(feature = "sentence")]
        Backend::Sentence => match &s.sentence.model_path {
            Some(path) => {
                let model_path = config.resolve_path(path);
                let tokenizer_dir = s.sentence.tokenizer_dir.as_deref().map(|d| config.resolve_path(d));
                let model = SentenceEmbedder::from_files(&model_path, tokenizer_dir.as_deref(), s.sentence.max_len)?;
                Ok(Box::new(model))
            }
            None => {
                let cache_dir = config.resolve_path(&s.sentence.cache_dir);
                Ok(Box::new(SentenceEmbedder::new(&s.sentence.model, cache_dir)?))
            }
        },
        #[cfg(not(feature = "sentence"))]
        Backend::Sentence => Err(Error::Configuration(
            "built without the `sentence` feature; pick another embedding.backend".into(),
        )),
        Backend::Remote => Ok(Box::new(RemoteEmbedder::new(&s.remote)?)),
        Backend::Fake => Ok(Box::new(FakeEmbedder::new(s.fake.dim))),
    }
}
