//! Shared plumbing for the HTTP-backed stores.

use super::StoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub fn client(timeout: Duration) -> Result<reqwest::Client, StoreError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("riscos-map/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Fails with [`StoreError::Upstream`] unless the response is 2xx.
pub async fn expect_success(endpoint: &str, response: reqwest::Response) -> Result<(), StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Upstream {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}

pub async fn read_json<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<T, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::Upstream {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    decode(endpoint, &body)
}

pub fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Upstream services answer single lookups as an object, a one-element
/// array, `null` or an empty body, depending on how they were wired.
pub fn first_record<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<Option<T>, StoreError> {
    let candidate = match value {
        Value::Null => return Ok(None),
        Value::Array(items) => match items.into_iter().next() {
            Some(item) => item,
            None => return Ok(None),
        },
        Value::Object(ref map) if map.is_empty() => return Ok(None),
        other => other,
    };
    serde_json::from_value(candidate)
        .map(Some)
        .map_err(|e| StoreError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: i32,
    }

    #[test]
    fn first_record_accepts_the_usual_shapes() {
        assert_eq!(first_record::<Row>("t", json!({"id": 1})).unwrap(), Some(Row { id: 1 }));
        assert_eq!(first_record::<Row>("t", json!([{"id": 2}, {"id": 3}])).unwrap(), Some(Row { id: 2 }));
        assert_eq!(first_record::<Row>("t", json!([])).unwrap(), None);
        assert_eq!(first_record::<Row>("t", json!({})).unwrap(), None);
        assert_eq!(first_record::<Row>("t", Value::Null).unwrap(), None);
        assert!(first_record::<Row>("t", json!({"id": "x"})).is_err());
    }

    #[test]
    fn iso_uses_utc_suffix() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T12:30:00+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(iso(ts), "2024-05-01T10:30:00.000000Z");
    }
}
