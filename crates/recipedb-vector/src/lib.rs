//! Candidate retrieval and vector ranking.
//!
//! The store returns `(id, name, blob)` rows; blobs are decoded here and
//! ranked by cosine similarity against the query vector.

pub mod blob;
pub mod rank;
pub mod retriever;
pub mod store;

pub use blob::{decode_vector, encode_vector};
pub use rank::{cosine, rank};
pub use retriever::CandidateRetriever;
pub use store::SqliteRecipeStore;
