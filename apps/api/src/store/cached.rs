use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::store::{CandidateStore, SavedCandidate, StoreError};

/// Bounds every call to the inner store with a timeout and serves the last
/// successful fetch when the inner store fails.
pub struct CachedStore {
    inner: Arc<dyn CandidateStore>,
    timeout: Duration,
    last_fetch: RwLock<Option<Vec<Value>>>,
}

impl CachedStore {
    pub fn new(inner: Arc<dyn CandidateStore>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            last_fetch: RwLock::new(None),
        }
    }
}

#[async_trait]
impl CandidateStore for CachedStore {
    async fn fetch_all_candidates(&self) -> Result<Vec<Value>, StoreError> {
        let result = match tokio::time::timeout(self.timeout, self.inner.fetch_all_candidates()).await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        };

        match result {
            Ok(candidates) => {
                *self.last_fetch.write().await = Some(candidates.clone());
                Ok(candidates)
            }
            Err(err) => match self.last_fetch.read().await.as_ref() {
                Some(cached) => {
                    warn!(
                        error = %err,
                        cached = cached.len(),
                        source = self.inner.source(),
                        "candidate fetch failed; serving cached pool"
                    );
                    Ok(cached.clone())
                }
                None => Err(err),
            },
        }
    }

    async fn save_candidate(&self, candidate: &Value) -> Result<SavedCandidate, StoreError> {
        let saved = tokio::time::timeout(self.timeout, self.inner.save_candidate(candidate))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        if let Some(cached) = self.last_fetch.write().await.as_mut() {
            let mut record = candidate.clone();
            if let Value::Object(fields) = &mut record {
                fields.insert("id".to_string(), Value::String(saved.id.clone()));
            }
            cached.push(record);
        }

        Ok(saved)
    }

    fn source(&self) -> &'static str {
        self.inner.source()
    }
}
