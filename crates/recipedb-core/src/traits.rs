use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Candidate, Category};

/// Text to vector capability shared by every embedding backend.
///
/// Implementations must return L2-normalized vectors of `dim()` components.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the backend/model (e.g. `bert:bge-small:d384`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// How wide the store-side candidate selection is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalScope {
    /// Recipes whose name or description contains any expanded term.
    #[default]
    Keyword,
    /// Every recipe with a stored vector; terms are not used as predicates.
    Catalog,
}

/// A fully-resolved candidate selection, ready to be executed by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub terms: Vec<String>,
    pub category: Option<Category>,
    pub scope: RetrievalScope,
    /// Blob column holding vectors for the active backend.
    pub embedding_column: String,
}

/// Read side of the recipe store.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// One round-trip returning every matching recipe with a non-null vector.
    async fn fetch_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>>;

    /// Active `(source, target)` rows of the expansion dictionary, in row order.
    async fn load_expansions(&self) -> Result<Vec<(String, String)>>;
}
