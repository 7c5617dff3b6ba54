//! Persistent cache adapters.
//!
//! - [`NoopCache`] forgets everything; useful when persistence is disabled.
//! - [`JsonFileCache`] mirrors the whole cache in memory and rewrites a JSON
//!   snapshot after every put.

mod json_file;
mod noop;

pub use json_file::{DEFAULT_CACHE_PATH, JsonFileCache};
pub use noop::NoopCache;
