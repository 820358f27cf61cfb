//! The query pipeline: normalize, detect category, retrieve candidates and
//! embed the query concurrently, then rank.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};

use recipedb_core::config::{Config, ExpansionSource, QueryText, RankingProfile};
use recipedb_core::traits::{EmbeddingProvider, RecipeStore};
use recipedb_core::types::{Category, NormalizedQuery, RankedResult};
use recipedb_core::Result;
use recipedb_text::{detect, normalize, ExpansionTable};
use recipedb_vector::{rank, CandidateRetriever, SqliteRecipeStore};

/// Everything one query produced, for display and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub query: NormalizedQuery,
    pub category: Option<Category>,
    /// Candidates handed to the ranker.
    pub candidates: usize,
    pub results: Vec<RankedResult>,
}

pub struct SearchEngine {
    store: Arc<dyn RecipeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    retriever: CandidateRetriever,
    profile: RankingProfile,
    source: ExpansionSource,
    expansions: RwLock<Arc<ExpansionTable>>,
}

impl SearchEngine {
    /// Build the engine and load the expansion table once.
    pub async fn new(
        store: Arc<dyn RecipeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        profile: RankingProfile,
        source: ExpansionSource,
    ) -> Result<Self> {
        let table = load_table(store.as_ref(), source).await?;
        let retriever = CandidateRetriever::for_profile(Arc::clone(&store), &profile);
        info!(
            embedder = embedder.embedder_id(),
            threshold = ?profile.threshold,
            cap = profile.cap,
            column = %profile.embedding_column,
            "search engine ready"
        );
        Ok(Self { store, embedder, retriever, profile, source, expansions: RwLock::new(Arc::new(table)) })
    }

    /// Open the configured SQLite store and use the active backend's profile.
    pub async fn from_config(config: &Config, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let settings = config.settings();
        let path = config.resolve_path(&settings.store.path);
        let store = SqliteRecipeStore::open(&path, settings.store.clone())?;
        Self::new(Arc::new(store), embedder, settings.active_profile().clone(), settings.expansion.source).await
    }

    pub fn profile(&self) -> &RankingProfile {
        &self.profile
    }

    /// Snapshot of the table used by the next query.
    pub async fn expansions(&self) -> Arc<ExpansionTable> {
        Arc::clone(&*self.expansions.read().await)
    }

    /// Reload the expansion table from its source. Queries already running
    /// finish with the table they started with. Returns the new entry count.
    pub async fn refresh_expansions(&self) -> Result<usize> {
        let table = load_table(self.store.as_ref(), self.source).await?;
        let len = table.len();
        *self.expansions.write().await = Arc::new(table);
        info!(entries = len, "expansion table refreshed");
        Ok(len)
    }

    pub async fn search(&self, raw: &str) -> Result<SearchOutcome> {
        let start = Instant::now();
        let table = self.expansions().await;
        let query = normalize(raw, &table);
        if query.is_empty() {
            return Ok(SearchOutcome::default());
        }
        let category = detect(&query);
        let text = match self.profile.query_text {
            QueryText::Expanded => query.to_text(),
            QueryText::Raw => raw.trim().to_string(),
        };
        debug!(?category, %text, "searching");

        let (candidates, vector) =
            tokio::try_join!(self.retriever.retrieve(&query, category), self.embedder.embed(&text))?;
        let results = rank(&vector, &candidates, self.profile.threshold, self.profile.cap)?;
        debug!(
            candidates = candidates.len(),
            results = results.len(),
            ms = start.elapsed().as_millis() as u64,
            "query done"
        );
        Ok(SearchOutcome { query, category, candidates: candidates.len(), results })
    }
}

async fn load_table(store: &dyn RecipeStore, source: ExpansionSource) -> Result<ExpansionTable> {
    match source {
        ExpansionSource::Builtin => Ok(ExpansionTable::builtin()),
        ExpansionSource::Store => Ok(ExpansionTable::from_pairs(store.load_expansions().await?)),
    }
}
