use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{CandidateStore, SavedCandidate, StoreError};

/// Process-local store. Used when no external store is configured, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Value>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// A small demo pool so a fresh deployment can be exercised end to end.
    pub fn with_sample_candidates() -> Self {
        Self::new(vec![
            json!({
                "id": "sample-1",
                "name": "张三",
                "title": "前端开发工程师",
                "skills": ["JavaScript", "React", "HTML", "CSS"],
                "experience": "4年",
                "education": "本科",
                "source": "sample"
            }),
            json!({
                "id": "sample-2",
                "name": "李四",
                "title": "后端开发工程师",
                "skills": ["Java", "Spring Boot", "MySQL"],
                "experience": "6年",
                "education": "硕士",
                "source": "sample"
            }),
        ])
    }
}

#[async_trait]
impl CandidateStore for InMemoryStore {
    async fn fetch_all_candidates(&self) -> Result<Vec<Value>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn save_candidate(&self, candidate: &Value) -> Result<SavedCandidate, StoreError> {
        let Value::Object(fields) = candidate else {
            return Err(StoreError::Malformed(
                "candidate must be a JSON object".to_string(),
            ));
        };

        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("mem-{}", Uuid::new_v4()));

        let mut record = fields.clone();
        record.insert("id".to_string(), Value::String(id.clone()));

        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            Some(existing) => *existing = Value::Object(record),
            None => records.push(Value::Object(record)),
        }

        Ok(SavedCandidate { id })
    }

    fn source(&self) -> &'static str {
        "memory"
    }
}
