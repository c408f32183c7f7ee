//! Firestore REST record store.
//!
//! Documents come back as typed field values (`{"stringValue": "admin"}`);
//! they are flattened into plain JSON before reaching the rest of the app.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::records::{Record, RecordStore, StoreError};

const CONNECT_TIMEOUT_SECS: u64 = 5;

pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    bearer_token: Option<String>,
}

impl FirestoreStore {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: String, project_id: String, bearer_token: Option<String>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("http client build: {e}")))?;
        Ok(Self { http, base_url, project_id, bearer_token })
    }

    fn document_url(&self, collection: &str, key: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url,
            self.project_id,
            urlencoding::encode(collection),
            urlencoding::encode(key)
        )
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fields: Map<String, Value>,
}

#[async_trait::async_trait]
impl RecordStore for FirestoreStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        let mut req = self.http.get(self.document_url(collection, key));
        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!("{status}: {body}")));
        }

        let doc: Document = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(decode_fields(doc.fields)))
    }
}

/// Flatten a Firestore `fields` map into plain JSON.
pub(crate) fn decode_fields(fields: Map<String, Value>) -> Record {
    fields
        .into_iter()
        .map(|(name, typed)| (name, decode_value(typed)))
        .collect()
}

/// Convert one typed Firestore value. Unsupported kinds decode to `null`.
pub(crate) fn decode_value(typed: Value) -> Value {
    let Value::Object(mut obj) = typed else {
        return Value::Null;
    };
    if let Some(v) = obj.remove("stringValue") {
        return v;
    }
    if let Some(v) = obj.remove("booleanValue") {
        return v;
    }
    if let Some(v) = obj.remove("doubleValue") {
        return v;
    }
    if let Some(v) = obj.remove("integerValue") {
        // Int64 travels as a decimal string.
        return match &v {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(v),
            _ => v,
        };
    }
    if let Some(v) = obj.remove("timestampValue") {
        return v;
    }
    if let Some(v) = obj.remove("referenceValue") {
        return v;
    }
    if let Some(Value::Object(mut map)) = obj.remove("mapValue") {
        let inner = match map.remove("fields") {
            Some(Value::Object(fields)) => fields,
            _ => Map::new(),
        };
        return Value::Object(decode_fields(inner));
    }
    if let Some(Value::Object(mut arr)) = obj.remove("arrayValue") {
        let values = match arr.remove("values") {
            Some(Value::Array(values)) => values,
            _ => Vec::new(),
        };
        return Value::Array(values.into_iter().map(decode_value).collect());
    }
    Value::Null
}

#[cfg(test)]
#[path = "firestore_test.rs"]
mod tests;
