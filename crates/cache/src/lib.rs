//! Generic memoization cache used by the tileset.

pub mod object_cache;

pub use object_cache::{Cache, CacheStats};
