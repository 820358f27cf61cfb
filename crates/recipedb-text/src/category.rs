use recipedb_core::types::{Category, NormalizedQuery};

/// Categories in scan order, each with its substring keywords.
///
/// The order is a contract: mutton before poultry before beef before fish
/// before legumes, whatever the order of terms in the query.
pub const SCAN_ORDER: &[(Category, &[&str])] = &[
    (Category::Mutton, &["mutton"]),
    (Category::Poultry, &["chicken"]),
    (Category::Beef, &["beef"]),
    (Category::Fish, &["fish"]),
    (Category::Legume, &["dal", "lentil"]),
];

/// First category in [`SCAN_ORDER`] with a keyword contained in any term.
///
/// Containment, not equality, so compound terms like "chicken curry in wok"
/// and "lentils" still match.
pub fn detect(query: &NormalizedQuery) -> Option<Category> {
    let lowered: Vec<String> = query.iter().map(str::to_lowercase).collect();
    SCAN_ORDER.iter().find_map(|(category, keywords)| {
        let hit = keywords.iter().any(|kw| lowered.iter().any(|term| term.contains(kw)));
        hit.then_some(*category)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(terms: &[&str]) -> NormalizedQuery {
        NormalizedQuery::from_terms(terms.iter().copied())
    }

    #[test]
    fn chicken_beats_beef() {
        assert_eq!(detect(&q(&["chicken", "beef", "curry"])), Some(Category::Poultry));
    }

    #[test]
    fn scan_order_wins_over_term_order() {
        assert_eq!(detect(&q(&["beef", "chicken"])), Some(Category::Poultry));
        assert_eq!(detect(&q(&["fish", "mutton"])), Some(Category::Mutton));
        // legumes come last even when listed first
        assert_eq!(detect(&q(&["lentils", "fish"])), Some(Category::Fish));
    }

    #[test]
    fn matches_inside_compound_terms() {
        assert_eq!(detect(&q(&["chicken curry in wok"])), Some(Category::Poultry));
        assert_eq!(detect(&q(&["wheat and lentil stew"])), Some(Category::Legume));
        assert_eq!(detect(&q(&["Catfish"])), Some(Category::Fish));
    }

    #[test]
    fn none_when_nothing_matches() {
        assert_eq!(detect(&q(&["rice pilaf", "potato"])), None);
        assert_eq!(detect(&NormalizedQuery::default()), None);
    }
}
