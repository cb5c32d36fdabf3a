//! Fuzzy full-text search over published posts.
//!
//! Every query rescans the whole corpus; there is no index.

pub mod engine;
pub mod query;
pub mod similarity;
pub mod tokenizer;

pub use engine::{QueryMatching, SearchEngine};
pub use query::SearchQuery;
pub use similarity::{JaroWinkler, SimilarityScorer};
pub use tokenizer::{ContentSource, TokenStream};
