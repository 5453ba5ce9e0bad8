//! Candidate store — the key-value resume pool behind the matcher.
//!
//! The matcher only needs two operations, so that is all the trait carries.
//! Records travel as raw JSON; normalization happens in `matching::normalize`.

pub mod airtable;
pub mod cached;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use airtable::AirtableStore;
pub use cached::CachedStore;
pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed store response: {0}")]
    Malformed(String),
}

/// Identifier assigned by the store to a saved candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCandidate {
    pub id: String,
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn fetch_all_candidates(&self) -> Result<Vec<Value>, StoreError>;

    async fn save_candidate(&self, candidate: &Value) -> Result<SavedCandidate, StoreError>;

    /// Short label reported alongside fetched candidates ("airtable", "memory").
    fn source(&self) -> &'static str;
}
