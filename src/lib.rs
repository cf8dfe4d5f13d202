//! docdown library
//!
//! Markdown rendering for documentation pages and a TTL cache for fetching
//! them from a document store. The `docdown` binary is a thin layer over
//! these modules.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod render;

pub use cache::{CacheConfig, DocumentCache};
pub use data::{DocId, DocumentSource, FetchError, HttpSource};
pub use render::render;
