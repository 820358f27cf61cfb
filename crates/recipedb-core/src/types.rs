//! Domain types shared by the normalizer, retriever and ranker.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub type RecipeId = i64;

/// Coarse protein classification used to narrow retrieval.
///
/// The discriminants are the values stored in the recipe table's category
/// column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Poultry = 1,
    Mutton = 2,
    Beef = 3,
    Fish = 4,
    Legume = 5,
}

impl Category {
    /// Value of the category column for recipes in this category.
    pub fn store_value(self) -> i64 {
        self as i64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Poultry => "poultry",
            Category::Mutton => "mutton",
            Category::Beef => "beef",
            Category::Fish => "fish",
            Category::Legume => "legume",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expanded query terms, de-duplicated case-insensitively.
///
/// Insertion order is kept so that retrieval parameters and fixtures are
/// reproducible; consumers must not assign meaning to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    terms: Vec<String>,
}

impl NormalizedQuery {
    /// Build from terms in order, dropping case-insensitive repeats.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for term in terms {
            let term = term.into();
            if seen.insert(term.to_lowercase()) {
                out.push(term);
            }
        }
        Self { terms: out }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.terms.iter().any(|t| t.to_lowercase() == needle)
    }

    /// Terms joined by single spaces; the text handed to the embedder.
    pub fn to_text(&self) -> String {
        self.terms.join(" ")
    }
}

/// A recipe eligible for ranking, as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: RecipeId,
    pub name: String,
    pub vector: Vec<f32>,
}

/// One line of a query response. `score` is a cosine similarity in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: RecipeId,
    pub name: String,
    pub score: f32,
}
