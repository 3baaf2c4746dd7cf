//! Distributed status cache for the MediaQ ingestion core.
//!
//! This crate provides:
//! - A Redis-backed cache of media item status views
//! - A versioned, strictly-decoded entry schema
//! - Failure semantics where every error degrades to a cache miss

pub mod cache;
pub mod entry;

pub use cache::{CacheConfig, StatusCache};
pub use entry::{decode, CacheEntry, SCHEMA_VERSION};
