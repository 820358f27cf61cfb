//! Query-side text processing: vernacular expansion, plural stripping and
//! category detection.

pub mod category;
pub mod expansion;
pub mod normalize;

pub use category::detect;
pub use expansion::ExpansionTable;
pub use normalize::{normalize, singularize};
