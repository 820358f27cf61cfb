//! Vernacular term → canonical English term mapping.

use std::collections::HashMap;

/// Built-in Roman-Urdu/Hindi dish vocabulary.
///
/// Multi-word keys are kept for parity with store-loaded dictionaries; the
/// normalizer looks up single tokens so they are never hit.
const BUILTIN: &[(&str, &[&str])] = &[
    ("keema", &["minced meat"]),
    ("keema alu", &["minced meat with potatoes"]),
    ("alu", &["potato"]),
    ("aaloo", &["potato"]),
    ("gosht", &["meat"]),
    ("chicken karahi", &["chicken curry in wok"]),
    ("karahi", &["curry in wok"]),
    ("salan", &["curry"]),
    ("shorba", &["stew"]),
    ("dal", &["lentils"]),
    ("daal", &["lentils"]),
    ("sabzi", &["vegetables"]),
    ("sabji", &["vegetables"]),
    ("biryani", &["biryani"]),
    ("pulao", &["rice pilaf"]),
    ("puloe", &["rice pilaf"]),
    ("yakhni", &["broth"]),
    ("bhuna", &["sautéed"]),
    ("masala", &["spices"]),
    ("tikka", &["grilled chunks"]),
    ("boti", &["meat chunks"]),
    ("nihari", &["slow-cooked meat stew"]),
    ("haleem", &["wheat and lentil stew"]),
    ("halwa", &["dessert pudding"]),
    ("paratha", &["layered flatbread"]),
    ("roti", &["flatbread"]),
    ("chapati", &["flatbread"]),
    ("naan", &["oven-baked bread"]),
    ("korma", &["creamy curry"]),
    ("seekh kabab", &["skewered minced meat"]),
    ("kofta", &["meatballs"]),
    ("kofte", &["meatballs"]),
    ("raita", &["yogurt dip"]),
    ("achar", &["pickle"]),
    ("pakora", &["fritters"]),
    ("samosa", &["stuffed pastry"]),
    ("gulab jamun", &["syrup balls dessert"]),
    ("ras malai", &["cream dessert"]),
    ("barfi", &["milk fudge"]),
    ("khichdi", &["rice and lentils porridge"]),
    ("majlis", &["meat wrap"]),
    ("ouzi", &["roasted rice and meat"]),
    ("kata kat", &["minced meat on griddle"]),
    ("beef", &["beef"]),
    ("mutton", &["mutton"]),
    ("chicken", &["chicken"]),
    ("fish", &["fish"]),
    ("egg", &["egg"]),
    ("boiled egg", &["boiled egg"]),
    ("fried egg", &["fried egg"]),
    ("omelette", &["omelette"]),
    ("bonda", &["fried snack"]),
    ("upma", &["semolina porridge"]),
    ("idli", &["steamed rice cakes"]),
    ("dosa", &["rice crepe"]),
    ("sambar", &["lentil stew"]),
    ("rasam", &["spicy soup"]),
    ("vada", &["fried savory doughnut"]),
    ("pav bhaji", &["mashed vegetable curry with bread"]),
    ("chole bhature", &["chickpeas with fried bread"]),
    ("rajma", &["kidney beans curry"]),
    ("paneer", &["cottage cheese"]),
    ("palak paneer", &["spinach with cottage cheese"]),
    ("matar paneer", &["peas with cottage cheese"]),
    ("malai kofta", &["cream-based meatballs"]),
    ("kheer", &["rice pudding"]),
    ("sheer khurma", &["vermicelli dessert"]),
    ("seviyan", &["sweet vermicelli"]),
    ("ladoo", &["sweet ball"]),
    ("jalebi", &["syrup-coated sweet spiral"]),
    ("peda", &["milk sweet"]),
    ("rabri", &["thickened milk dessert"]),
    ("chawal", &["rice"]),
    (
        "barbeque",
        &["tikka", "malai boti", "beaf boti", "behari boti", "seekh boti", "seekh kabab", "seekh kebab"],
    ),
];

/// Case-insensitive mapping from a source term to its replacement terms.
///
/// Immutable once built; swap the whole table to pick up new entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionTable {
    entries: HashMap<String, Vec<String>>,
}

impl ExpansionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in vernacular vocabulary.
    pub fn builtin() -> Self {
        Self::from_pairs(
            BUILTIN
                .iter()
                .flat_map(|(source, targets)| targets.iter().map(move |t| (*source, *t))),
        )
    }

    /// Build from `(source, target)` rows. Sources are trimmed and
    /// lowercased, targets trimmed; repeated sources accumulate in order.
    /// Rows with a blank side are skipped.
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for (source, target) in pairs {
            let source = source.as_ref().trim().to_lowercase();
            let target = target.as_ref().trim();
            if source.is_empty() || target.is_empty() {
                continue;
            }
            entries.entry(source).or_default().push(target.to_string());
        }
        Self { entries }
    }

    /// Replacement terms for `term`, if it has an entry.
    pub fn lookup(&self, term: &str) -> Option<&[String]> {
        self.entries.get(&term.to_lowercase()).map(Vec::as_slice)
    }

    /// Replacements for `term`, or the term itself when it has no entry.
    pub fn expand<'a>(&'a self, term: &'a str) -> Vec<&'a str> {
        match self.lookup(term) {
            Some(targets) => targets.iter().map(String::as_str).collect(),
            None => vec![term],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
