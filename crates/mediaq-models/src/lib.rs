//! Shared data models for the MediaQ ingestion core.
//!
//! This crate provides Serde-serializable types for:
//! - Media item records and their status state machine
//! - Analysis result entries with boundary validation and dedup
//! - The queue message wire type handed to workers

pub mod item;
pub mod message;
pub mod status;

// Re-export common types
pub use item::{filter_valid_entries, merge_results, MediaItem, ResultEntry, ValidationError};
pub use message::JobMessage;
pub use status::{MediaStatus, Transition};
