//! Client-side caching primitives.

mod memory;

pub use memory::CacheStore;
