use std::sync::Arc;
use tracing::debug;

use recipedb_core::config::RankingProfile;
use recipedb_core::traits::{CandidateQuery, RecipeStore, RetrievalScope};
use recipedb_core::types::{Candidate, Category, NormalizedQuery};
use recipedb_core::Result;

/// Turns expanded terms and an optional category into one store round-trip.
pub struct CandidateRetriever {
    store: Arc<dyn RecipeStore>,
    scope: RetrievalScope,
    embedding_column: String,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn RecipeStore>, scope: RetrievalScope, embedding_column: impl Into<String>) -> Self {
        Self { store, scope, embedding_column: embedding_column.into() }
    }

    pub fn for_profile(store: Arc<dyn RecipeStore>, profile: &RankingProfile) -> Self {
        Self::new(store, profile.scope, profile.embedding_column.clone())
    }

    /// Empty queries never reach the store: zero OR-ed predicates match nothing.
    pub async fn retrieve(&self, expanded: &NormalizedQuery, filter: Option<Category>) -> Result<Vec<Candidate>> {
        if expanded.is_empty() {
            return Ok(Vec::new());
        }
        let query = CandidateQuery {
            terms: expanded.terms().to_vec(),
            category: filter,
            scope: self.scope,
            embedding_column: self.embedding_column.clone(),
        };
        let candidates = self.store.fetch_candidates(&query).await?;
        debug!(terms = expanded.len(), category = ?filter, count = candidates.len(), "retrieved candidates");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        seen: Mutex<Vec<CandidateQuery>>,
    }

    #[async_trait]
    impl RecipeStore for RecordingStore {
        async fn fetch_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(vec![Candidate { id: 1, name: "Chicken Karahi".into(), vector: vec![1.0, 0.0] }])
        }

        async fn load_expansions(&self) -> Result<Vec<(String, String)>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn empty_query_skips_the_store() {
        let store = Arc::new(RecordingStore::default());
        let retriever = CandidateRetriever::new(store.clone(), RetrievalScope::Keyword, "embedding_bge");
        let out = retriever.retrieve(&NormalizedQuery::default(), None).await.unwrap();
        assert!(out.is_empty());
        assert!(store.seen.lock().unwrap().is_empty());

        let catalog = CandidateRetriever::new(store.clone(), RetrievalScope::Catalog, "embedding_bge");
        assert!(catalog.retrieve(&NormalizedQuery::default(), None).await.unwrap().is_empty());
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forwards_terms_category_and_column() {
        let store = Arc::new(RecordingStore::default());
        let retriever = CandidateRetriever::new(store.clone(), RetrievalScope::Keyword, "embedding_minilm");
        let q = NormalizedQuery::from_terms(["chicken", "karahi"]);
        let out = retriever.retrieve(&q, Some(Category::Poultry)).await.unwrap();
        assert_eq!(out.len(), 1);

        let seen = store.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].terms, vec!["chicken".to_string(), "karahi".to_string()]);
        assert_eq!(seen[0].category, Some(Category::Poultry));
        assert_eq!(seen[0].embedding_column, "embedding_minilm");
    }
}
