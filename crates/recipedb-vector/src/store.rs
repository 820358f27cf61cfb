//! SQLite-backed [`RecipeStore`].
//!
//! Table and column names come from `[store]` and are validated before they
//! are interpolated; every user-supplied value is bound as a parameter.

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

use recipedb_core::config::{validate_identifier, StoreSettings};
use recipedb_core::traits::{CandidateQuery, RecipeStore, RetrievalScope};
use recipedb_core::types::Candidate;
use recipedb_core::{Error, Result};

use crate::blob::decode_vector;

pub struct SqliteRecipeStore {
    conn: Arc<Mutex<Connection>>,
    settings: StoreSettings,
}

fn store_error(e: rusqlite::Error) -> Error {
    Error::Store(e.to_string())
}

impl SqliteRecipeStore {
    /// Open an existing database read-only.
    pub fn open(path: &Path, settings: StoreSettings) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| Error::Store(format!("cannot open {}: {e}", path.display())))?;
        info!(path = %path.display(), table = %settings.table, "opened recipe store");
        Ok(Self::from_connection(conn, settings))
    }

    pub fn from_connection(conn: Connection, settings: StoreSettings) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)), settings }
    }

    /// SQL and bound values for one candidate selection.
    ///
    /// Each term is bound once and tested against both name and description.
    pub fn candidate_sql(&self, query: &CandidateQuery) -> Result<(String, Vec<Value>)> {
        validate_identifier(&query.embedding_column)?;
        let s = &self.settings;
        let mut sql = format!(
            "SELECT {id}, {name}, {emb} FROM {table} WHERE {emb} IS NOT NULL",
            id = s.id_column,
            name = s.name_column,
            emb = query.embedding_column,
            table = s.table,
        );
        let mut values = Vec::new();

        if query.scope == RetrievalScope::Keyword {
            let mut ors = Vec::with_capacity(query.terms.len());
            for term in &query.terms {
                values.push(Value::Text(format!("%{}%", escape_like(term))));
                let n = values.len();
                ors.push(format!(
                    "{name} LIKE ?{n} ESCAPE '\\' OR {desc} LIKE ?{n} ESCAPE '\\'",
                    name = s.name_column,
                    desc = s.description_column,
                ));
            }
            sql.push_str(&format!(" AND ({})", ors.join(" OR ")));
        }

        if let Some(category) = query.category {
            values.push(Value::Integer(category.store_value()));
            sql.push_str(&format!(" AND {} = ?{}", s.category_column, values.len()));
        }

        sql.push_str(&format!(" ORDER BY {}", s.id_column));
        Ok((sql, values))
    }
}

/// Make `%`, `_` and `\` literal inside a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn fetch_candidates(&self, query: &CandidateQuery) -> Result<Vec<Candidate>> {
        if query.scope == RetrievalScope::Keyword && query.terms.is_empty() {
            return Ok(Vec::new());
        }
        let (sql, values) = self.candidate_sql(query)?;
        debug!(%sql, params = values.len(), "candidate query");

        let conn = Arc::clone(&self.conn);
        let start = Instant::now();
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(i64, Option<String>, Vec<u8>)>> {
            let conn = conn.lock().map_err(|e| Error::Store(format!("connection lock poisoned: {e}")))?;
            let mut stmt = conn.prepare(&sql).map_err(store_error)?;
            let rows = stmt
                .query_map(params_from_iter(values), |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .map_err(store_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_error)
        })
        .await
        .map_err(|e| Error::Store(format!("store task failed: {e}")))??;

        let candidates = rows
            .into_iter()
            .map(|(id, name, blob)| {
                let vector = decode_vector(&blob).map_err(|e| match e {
                    Error::CorruptVector(msg) => Error::CorruptVector(format!("recipe {id}: {msg}")),
                    other => other,
                })?;
                Ok(Candidate { id, name: name.unwrap_or_default(), vector })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(count = candidates.len(), ms = start.elapsed().as_millis() as u64, "fetched candidates");
        Ok(candidates)
    }

    async fn load_expansions(&self) -> Result<Vec<(String, String)>> {
        let sql = format!(
            "SELECT source_term, target_term FROM {} WHERE is_active = 1 ORDER BY rowid",
            self.settings.dictionary_table
        );
        let conn = Arc::clone(&self.conn);
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(Option<String>, Option<String>)>> {
            let conn = conn.lock().map_err(|e| Error::Store(format!("connection lock poisoned: {e}")))?;
            let mut stmt = conn.prepare(&sql).map_err(store_error)?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?))).map_err(store_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_error)
        })
        .await
        .map_err(|e| Error::Store(format!("store task failed: {e}")))??;

        let pairs: Vec<(String, String)> = rows
            .into_iter()
            .filter_map(|(source, target)| Some((source?, target?)))
            .collect();
        info!(rows = pairs.len(), table = %self.settings.dictionary_table, "loaded expansion dictionary");
        Ok(pairs)
    }
}
