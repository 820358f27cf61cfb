//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, so
//! `APP_EMBEDDING__BACKEND=remote` sets `embedding.backend`). Provides helpers
//! to expand `~` and `${VAR}` and to resolve relative paths against the
//! directory the configuration was loaded from.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::traits::RetrievalScope;

pub struct Config {
    settings: Settings,
    base_dir: PathBuf,
    env_name: String,
}

impl Config {
    /// Load from the current working directory.
    pub fn load() -> Result<Self> {
        let cwd = env::current_dir()
            .map_err(|e| Error::Configuration(format!("cannot read working directory: {e}")))?;
        Self::load_from(&cwd)
    }

    /// Load `config.toml` and the `RUST_ENV` overlay from `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(Self { settings, base_dir: dir.to_path_buf(), env_name })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Resolve a configured path against the configuration directory.
    pub fn resolve_path(&self, p: &str) -> PathBuf {
        resolve_with_base(&self.base_dir, p)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub store: StoreSettings,
    pub expansion: ExpansionSettings,
    pub embedding: EmbeddingSettings,
    pub ranking: RankingSettings,
}

impl Settings {
    /// The ranking policy of the configured backend.
    pub fn active_profile(&self) -> &RankingProfile {
        self.ranking.for_backend(self.embedding.backend)
    }

    fn validate(&self) -> Result<()> {
        let s = &self.store;
        for ident in [
            &s.table,
            &s.id_column,
            &s.name_column,
            &s.description_column,
            &s.category_column,
            &s.dictionary_table,
        ] {
            validate_identifier(ident)?;
        }
        for backend in Backend::ALL {
            let profile = self.ranking.for_backend(backend);
            validate_identifier(&profile.embedding_column)?;
            if profile.cap == 0 {
                return Err(Error::Configuration(format!("ranking.{backend}.cap must be positive")));
            }
            if let Some(t) = profile.threshold {
                if !(-1.0..=1.0).contains(&t) {
                    return Err(Error::Configuration(format!(
                        "ranking.{backend}.threshold must lie in [-1, 1], got {t}"
                    )));
                }
            }
        }
        let e = &self.embedding;
        for (key, value) in [
            ("bert.max_len", e.bert.max_len),
            ("sentence.max_len", e.sentence.max_len),
            ("remote.dim", e.remote.dim),
            ("fake.dim", e.fake.dim),
        ] {
            if value == 0 {
                return Err(Error::Configuration(format!("embedding.{key} must be positive")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite database file.
    pub path: String,
    pub table: String,
    pub id_column: String,
    pub name_column: String,
    pub description_column: String,
    pub category_column: String,
    /// Table with `source_term`, `target_term`, `is_active` columns.
    pub dictionary_table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: "recipes.db".into(),
            table: "recipes".into(),
            id_column: "recipe_id".into(),
            name_column: "recipe_name".into(),
            description_column: "description".into(),
            category_column: "protein_type_id".into(),
            dictionary_table: "preprocessing_dictionary".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionSource {
    #[default]
    Builtin,
    Store,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpansionSettings {
    pub source: ExpansionSource,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Token-pooled BERT inference (candle).
    #[default]
    Bert,
    /// Pre-pooled sentence encoder (fastembed).
    Sentence,
    /// Remote embeddings API.
    Remote,
    /// Deterministic hashing embedder for development and tests.
    Fake,
}

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Bert, Backend::Sentence, Backend::Remote, Backend::Fake];

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Bert => "bert",
            Backend::Sentence => "sentence",
            Backend::Remote => "remote",
            Backend::Fake => "fake",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub backend: Backend,
    pub bert: BertSettings,
    pub sentence: SentenceSettings,
    pub remote: RemoteSettings,
    pub fake: FakeSettings,
}

/// Directory holding `config.json`, `tokenizer.json` and
/// `model.safetensors` (or `pytorch_model.bin`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BertSettings {
    pub model_dir: String,
    pub max_len: usize,
}

impl Default for BertSettings {
    fn default() -> Self {
        Self { model_dir: "models/bge-small-en-v1.5".into(), max_len: 512 }
    }
}

/// Either a local ONNX export (`model_path`, with the tokenizer JSON files
/// next to it or in `tokenizer_dir`) or a named model downloaded into
/// `cache_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceSettings {
    pub model: String,
    pub cache_dir: String,
    pub model_path: Option<String>,
    pub tokenizer_dir: Option<String>,
    pub max_len: usize,
}

impl Default for SentenceSettings {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".into(),
            cache_dir: "models".into(),
            model_path: None,
            tokenizer_dir: None,
            max_len: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub endpoint: String,
    pub model: String,
    pub dim: usize,
    /// Inline credential; takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".into(),
            model: "text-embedding-3-large".into(),
            dim: 3072,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 30,
        }
    }
}

impl RemoteSettings {
    /// The bearer credential, from config or from the named env var.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.trim().to_string());
        }
        match env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(Error::Configuration(format!(
                "no API key: set embedding.remote.api_key or {}",
                self.api_key_env
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeSettings {
    pub dim: usize,
}

impl Default for FakeSettings {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

/// Which text is embedded for a query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryText {
    /// Expanded terms joined by single spaces.
    #[default]
    Expanded,
    /// The trimmed user input.
    Raw,
}

/// Per-backend ranking policy. Thresholds are not comparable across backends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingProfile {
    /// Minimum cosine score kept; `None` keeps everything.
    pub threshold: Option<f32>,
    pub cap: usize,
    pub embedding_column: String,
    pub scope: RetrievalScope,
    pub query_text: QueryText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingSettings {
    pub bert: RankingProfile,
    pub sentence: RankingProfile,
    pub remote: RankingProfile,
    pub fake: RankingProfile,
}

impl RankingSettings {
    pub fn for_backend(&self, backend: Backend) -> &RankingProfile {
        match backend {
            Backend::Bert => &self.bert,
            Backend::Sentence => &self.sentence,
            Backend::Remote => &self.remote,
            Backend::Fake => &self.fake,
        }
    }
}

impl Default for RankingSettings {
    fn default() -> Self {
        let profile = |threshold, cap, column: &str, query_text| RankingProfile {
            threshold,
            cap,
            embedding_column: column.to_string(),
            scope: RetrievalScope::Keyword,
            query_text,
        };
        Self {
            bert: profile(Some(0.65), 100, "embedding_bge", QueryText::Expanded),
            sentence: profile(Some(0.35), 20, "embedding_minilm", QueryText::Expanded),
            remote: profile(None, 10, "embedding", QueryText::Raw),
            fake: profile(None, 10, "embedding_fake", QueryText::Expanded),
        }
    }
}

/// SQL identifiers are interpolated, never bound, so only plain names pass.
pub fn validate_identifier(ident: &str) -> Result<()> {
    let ok = !ident.is_empty()
        && !ident.starts_with(|c: char| c.is_ascii_digit())
        && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(Error::Configuration(format!("invalid SQL identifier '{ident}'")))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_reject_sql_fragments() {
        assert!(validate_identifier("embedding_bge").is_ok());
        assert!(validate_identifier("Recipes2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1col").is_err());
        assert!(validate_identifier("name; DROP TABLE recipes").is_err());
        assert!(validate_identifier("a.b").is_err());
    }

    #[test]
    fn default_profiles_differ_per_backend() {
        let r = RankingSettings::default();
        assert_eq!(r.bert.threshold, Some(0.65));
        assert_eq!(r.bert.cap, 100);
        assert_eq!(r.sentence.threshold, Some(0.35));
        assert_eq!(r.sentence.cap, 20);
        assert_eq!(r.remote.threshold, None);
        assert_eq!(r.remote.cap, 10);
        assert_eq!(r.remote.query_text, QueryText::Raw);
        assert_eq!(r.bert.query_text, QueryText::Expanded);
    }

    #[test]
    fn resolve_keeps_absolute_and_joins_relative() {
        let base = Path::new("/srv/recipes");
        assert_eq!(resolve_with_base(base, "/data/r.db"), PathBuf::from("/data/r.db"));
        assert_eq!(resolve_with_base(base, "r.db"), PathBuf::from("/srv/recipes/r.db"));
    }
}
