use crate::auth::BasicCredentials;
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A GET request: the absolute URL plus its query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
}

impl RequestSpec {
    pub fn new(url: String) -> Self {
        Self {
            url,
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// Value of the first query pair named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends an authenticated GET and deserializes a successful response body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    credentials: &BasicCredentials,
    req: &RequestSpec,
) -> Result<T, ApiError> {
    tracing::debug!(url = %req.url, "Sending upstream request.");
    let request = client.get(&req.url).query(&req.query);
    let response = credentials.apply(request).send().await?;
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    } else {
        Err(ApiError::Status {
            url: req.url.clone(),
            status: status.as_u16(),
            body: text,
        })
    }
}

/// Keeps records whose first present timestamp field is at or after `start`,
/// then caps the list at `max_items`.
///
/// Records without any of the fields are kept; ingestion decides what to do
/// with them.
pub(crate) fn retain_window(records: Vec<Value>, fields: &[&str], start: DateTime<Utc>, max_items: u32) -> Vec<Value> {
    records
        .into_iter()
        .filter(|record| match first_timestamp(record, fields) {
            Some(ts) => ts >= start,
            None => true,
        })
        .take(max_items as usize)
        .collect()
}

fn first_timestamp(record: &Value, fields: &[&str]) -> Option<DateTime<Utc>> {
    fields.iter().find_map(|field| {
        record
            .get(*field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn retain_window_filters_then_caps() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let records = vec![
            json!({"id": 1, "closed_at": "2024-03-05T00:00:00Z"}),
            json!({"id": 2, "closed_at": null, "created_at": "2024-02-01T00:00:00Z"}),
            json!({"id": 3, "created_at": "2024-03-01T00:00:00Z"}),
            json!({"id": 4}),
            json!({"id": 5, "created_at": "2024-03-09T00:00:00Z"}),
        ];

        let kept = retain_window(records, &["closed_at", "created_at"], start, 3);
        let ids: Vec<_> = kept.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn request_spec_lookup() {
        let req = RequestSpec::new("https://x".to_string())
            .param("a", "1")
            .param("b", "2");
        assert_eq!(req.get("b"), Some("2"));
        assert_eq!(req.get("c"), None);
    }
}
