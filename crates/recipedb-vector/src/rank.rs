//! Cosine ranking with a per-backend threshold and result cap.

use recipedb_core::types::{Candidate, RankedResult};
use recipedb_core::{Error, Result};

/// Added to the norm product before dividing.
pub const COSINE_EPS: f32 = 1e-10;

/// Cosine similarity. Neither side is assumed to be unit length.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    dot / (na.sqrt() * nb.sqrt() + COSINE_EPS)
}

/// Score every candidate against `query`, drop those strictly below
/// `threshold`, sort descending and keep the first `cap`.
///
/// Ties keep retrieval order. A candidate whose vector length differs from
/// the query's fails the whole ranking with [`Error::DimensionMismatch`]; one
/// whose score is NaN fails it with [`Error::CorruptVector`].
pub fn rank(
    query: &[f32],
    candidates: &[Candidate],
    threshold: Option<f32>,
    cap: usize,
) -> Result<Vec<RankedResult>> {
    let mut scored = Vec::with_capacity(candidates.len());
    for c in candidates {
        if c.vector.len() != query.len() {
            return Err(Error::DimensionMismatch { id: c.id, expected: query.len(), got: c.vector.len() });
        }
        let score = cosine(query, &c.vector);
        if score.is_nan() {
            return Err(Error::CorruptVector(format!("recipe {}: similarity is NaN", c.id)));
        }
        if threshold.map_or(true, |t| score >= t) {
            scored.push(RankedResult { id: c.id, name: c.name.clone(), score });
        }
    }
    // sort_by is stable, so equal scores stay in retrieval order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(cap);
    Ok(scored)
}
