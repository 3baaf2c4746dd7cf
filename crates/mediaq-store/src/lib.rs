//! Status store backed by the Firestore REST API.
//!
//! This crate provides:
//! - A typed repository for media item status records
//! - Atomic sequence id issuance via server-side increments
//! - Service account authentication via gcp_auth
//! - Emulator support for local development and tests

pub mod client;
pub mod error;
pub mod items;
pub mod metrics;
pub mod sequence;
pub mod token_cache;
pub mod types;

pub use client::{StoreClient, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use items::ItemRepository;
pub use sequence::SequenceGenerator;
pub use types::{Document, FromStoreValue, ToStoreValue, Value};
