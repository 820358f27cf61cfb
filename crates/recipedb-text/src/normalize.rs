use recipedb_core::types::NormalizedQuery;
use tracing::debug;

use crate::expansion::ExpansionTable;

/// Heuristic plural stripper, applied before table lookup.
///
/// `ies` → `y`, then `es` → ``, then a trailing `s` on tokens longer than
/// three characters. Known to mangle some words ("glasses" → "glass",
/// "cookies" → "cooky", "gas" kept, "axes" → "ax").
pub fn singularize(token: &str) -> String {
    if let Some(stem) = token.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = token.strip_suffix("es") {
        return stem.to_string();
    }
    if token.chars().count() > 3 {
        if let Some(stem) = token.strip_suffix('s') {
            return stem.to_string();
        }
    }
    token.to_string()
}

/// Split on whitespace, lowercase, singularize, expand, de-duplicate.
///
/// Tokens that singularize to nothing (a bare "es") are dropped so they can
/// never turn into a match-everything predicate.
pub fn normalize(raw: &str, table: &ExpansionTable) -> NormalizedQuery {
    let mut expanded: Vec<String> = Vec::new();
    for word in raw.split_whitespace() {
        let token = singularize(&word.to_lowercase());
        if token.is_empty() {
            continue;
        }
        expanded.extend(table.expand(&token).into_iter().map(str::to_string));
    }
    let query = NormalizedQuery::from_terms(expanded);
    debug!(raw, terms = ?query.terms(), "normalized query");
    query
}
