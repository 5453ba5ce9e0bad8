//! Airtable-backed resume pool.
//!
//! Column names ("Name", "Skills", ...) must match the Airtable table exactly.
//! Structured values (contact, education objects) are stored as pretty JSON in
//! long-text columns and decoded again on read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::AirtableConfig;
use crate::documents::text_preview;
use crate::store::{CandidateStore, SavedCandidate, StoreError};

const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
const PAGE_SIZE: u32 = 100;

/// (Airtable column, candidate field)
const COLUMN_MAP: &[(&str, &str)] = &[
    ("Name", "name"),
    ("Title", "title"),
    ("Skills", "skills"),
    ("Experience", "experience"),
    ("Education", "education"),
    ("Contact", "contact"),
    ("Source", "source"),
    ("Upload Date", "uploadDate"),
    ("RawTextPreview", "rawTextPreview"),
];

#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    records: Vec<AirtableRecord>,
}

pub struct AirtableStore {
    client: Client,
    config: AirtableConfig,
    api_url: String,
}

impl AirtableStore {
    pub fn new(config: AirtableConfig, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            config,
            api_url: AIRTABLE_API_URL.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.api_url, self.config.base_id, self.config.table_name
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CandidateStore for AirtableStore {
    async fn fetch_all_candidates(&self) -> Result<Vec<Value>, StoreError> {
        let mut candidates = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.table_url())
                .bearer_auth(&self.config.api_key)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset)]);
            }

            let page: ListResponse = Self::check(request.send().await?).await?.json().await?;
            debug!(records = page.records.len(), "fetched Airtable page");
            candidates.extend(page.records.into_iter().map(record_to_candidate));

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        info!(
            count = candidates.len(),
            table = %self.config.table_name,
            "loaded candidates from Airtable"
        );
        Ok(candidates)
    }

    async fn save_candidate(&self, candidate: &Value) -> Result<SavedCandidate, StoreError> {
        let fields = candidate_to_fields(candidate, Utc::now());
        let body = json!({ "records": [{ "fields": fields }] });

        let response = self
            .client
            .post(self.table_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let created: CreateResponse = Self::check(response).await?.json().await?;

        let record = created
            .records
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed("Airtable created no record".to_string()))?;

        info!(id = %record.id, "saved candidate to Airtable");
        Ok(SavedCandidate { id: record.id })
    }

    fn source(&self) -> &'static str {
        "airtable"
    }
}

/// Maps an Airtable record onto a raw candidate record. Unknown columns pass
/// through under their column name.
fn record_to_candidate(record: AirtableRecord) -> Value {
    let mut candidate = Map::new();
    candidate.insert("id".to_string(), Value::String(record.id));

    for (column, value) in record.fields {
        let key = COLUMN_MAP
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, field)| field.to_string())
            .unwrap_or(column);
        let value = if key == "contact" {
            decode_json_text(value)
        } else {
            value
        };
        candidate.insert(key, value);
    }

    Value::Object(candidate)
}

/// Long-text columns may hold JSON written by `candidate_to_fields`.
fn decode_json_text(value: Value) -> Value {
    if let Value::String(s) = &value {
        if s.trim_start().starts_with('{') {
            if let Ok(decoded) = serde_json::from_str::<Value>(s) {
                return decoded;
            }
        }
    }
    value
}

/// Builds the Airtable column payload for a candidate record.
fn candidate_to_fields(candidate: &Value, now: DateTime<Utc>) -> Map<String, Value> {
    let get = |key: &str| candidate.get(key).filter(|v| !v.is_null());

    let mut fields = Map::new();
    fields.insert(
        "Name".to_string(),
        json!(get("name").map(text_column).unwrap_or_else(|| "unknown".to_string())),
    );
    fields.insert(
        "Title".to_string(),
        json!(get("title").map(text_column).unwrap_or_default()),
    );
    let skills = match get("skills") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|s| match s {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => text_column(other),
        None => String::new(),
    };
    fields.insert("Skills".to_string(), json!(skills));
    for (column, key) in [("Experience", "experience"), ("Education", "education"), ("Contact", "contact")] {
        fields.insert(
            column.to_string(),
            json!(get(key).map(text_column).unwrap_or_default()),
        );
    }
    fields.insert(
        "Source".to_string(),
        json!(get("source").map(text_column).unwrap_or_else(|| "unknown source".to_string())),
    );
    fields.insert("Upload Date".to_string(), json!(now.to_rfc3339()));

    let preview = get("rawTextPreview")
        .and_then(Value::as_str)
        .map(String::from)
        .or_else(|| get("rawText").and_then(Value::as_str).map(text_preview));
    if let Some(preview) = preview {
        fields.insert("RawTextPreview".to_string(), json!(preview));
    }

    fields
}

/// Strings verbatim; structured values as pretty JSON.
fn text_column(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(fields: Value) -> AirtableRecord {
        AirtableRecord {
            id: "recABC".to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_record_maps_columns_to_candidate_fields() {
        let candidate = record_to_candidate(record(json!({
            "Name": "张三",
            "Skills": "JavaScript, React",
            "Education": "本科",
            "Contact": "{\n  \"email\": \"zs@example.com\"\n}",
            "Notes": "referred"
        })));
        assert_eq!(candidate["id"], "recABC");
        assert_eq!(candidate["name"], "张三");
        assert_eq!(candidate["skills"], "JavaScript, React");
        assert_eq!(candidate["education"], "本科");
        assert_eq!(candidate["contact"]["email"], "zs@example.com");
        assert_eq!(candidate["Notes"], "referred");
    }

    #[test]
    fn test_candidate_to_fields_flattens_structures() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let fields = candidate_to_fields(
            &json!({
                "name": "李四",
                "skills": ["Java", "MySQL"],
                "education": {"degree": "硕士", "school": "某大学"},
                "contact": {"phone": "123"},
                "source": "li.pdf"
            }),
            now,
        );
        assert_eq!(fields["Name"], "李四");
        assert_eq!(fields["Skills"], "Java, MySQL");
        assert!(fields["Education"].as_str().unwrap().contains("\"degree\": \"硕士\""));
        assert_eq!(fields["Source"], "li.pdf");
        assert_eq!(fields["Upload Date"], "2026-01-02T03:04:05+00:00");
        assert!(fields.get("RawTextPreview").is_none());
    }

    #[test]
    fn test_candidate_to_fields_defaults() {
        let fields = candidate_to_fields(&json!({}), Utc::now());
        assert_eq!(fields["Name"], "unknown");
        assert_eq!(fields["Skills"], "");
        assert_eq!(fields["Source"], "unknown source");
    }

    #[test]
    fn test_raw_text_preview_truncates() {
        let long = "字".repeat(600);
        let fields = candidate_to_fields(&json!({"rawText": long}), Utc::now());
        let preview = fields["RawTextPreview"].as_str().unwrap();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 503);
    }

    #[test]
    fn test_contact_round_trips_through_text_column() {
        let now = Utc::now();
        let fields = candidate_to_fields(&json!({"contact": {"email": "a@b.c"}}), now);
        let candidate = record_to_candidate(AirtableRecord {
            id: "rec1".to_string(),
            fields,
        });
        assert_eq!(candidate["contact"]["email"], "a@b.c");
    }
}
