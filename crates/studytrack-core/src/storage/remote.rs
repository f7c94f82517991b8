//! Remote REST key-value store.
//!
//! Speaks the path convention of hosted realtime JSON databases:
//! `GET {base}/{namespace}.json` returns an object of key -> record (or
//! `null` when empty); `PUT`/`DELETE {base}/{namespace}/{key}.json` write or
//! remove one record. An auth token, when configured, is sent as the
//! `auth` query parameter.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::debug;
use url::Url;

use super::{decode_record, RecordStore};
use crate::error::{ConfigError, CoreError, StoreError};
use crate::study::{TaskEntry, TaskRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RemoteStore {
    client: Client,
    base: Url,
    namespace: String,
    auth_token: Option<String>,
}

impl RemoteStore {
    pub fn new(base_url: &str, namespace: &str, auth_token: Option<String>) -> Result<Self, CoreError> {
        let base = Url::parse(base_url.trim()).map_err(|e| ConfigError::InvalidValue {
            key: "storage.remote_url".into(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                key: "storage.remote_url".into(),
                message: format!("{base} cannot be used as a base URL"),
            }
            .into());
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(StoreError::from)?;
        Ok(Self {
            client,
            base,
            namespace: namespace.to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()),
        })
    }

    /// `{base}/{namespace}[/{key}].json`
    fn endpoint(&self, key: Option<&str>) -> Url {
        let mut parts: Vec<String> = self
            .namespace
            .split('/')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if let Some(key) = key {
            parts.push(key.to_string());
        }
        if let Some(last) = parts.last_mut() {
            last.push_str(".json");
        }

        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(parts.iter());
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        url
    }
}

fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = resp.text().unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

impl RecordStore for RemoteStore {
    fn load_all(&self) -> Result<Vec<TaskEntry>, StoreError> {
        let resp = check(self.client.get(self.endpoint(None)).send()?)?;
        let body: serde_json::Value = resp.json()?;
        let entries: Vec<TaskEntry> = match body {
            serde_json::Value::Object(map) => map
                .into_iter()
                .filter_map(|(key, value)| decode_record(&key, value))
                .collect(),
            serde_json::Value::Null => Vec::new(),
            other => {
                return Err(StoreError::Corrupt {
                    key: self.namespace.clone(),
                    message: format!("expected an object, got {other}"),
                })
            }
        };
        debug!(namespace = %self.namespace, count = entries.len(), "loaded remote records");
        Ok(entries)
    }

    fn put(&self, key: &str, record: &TaskRecord) -> Result<(), StoreError> {
        check(self.client.put(self.endpoint(Some(key))).json(record).send()?)?;
        debug!(namespace = %self.namespace, key, "remote record written");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        check(self.client.delete(self.endpoint(Some(key))).send()?)?;
        debug!(namespace = %self.namespace, key, "remote record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_namespace_and_key() {
        let store = RemoteStore::new("https://db.example.com/", "users/alice/tasks", None).unwrap();
        assert_eq!(
            store.endpoint(None).as_str(),
            "https://db.example.com/users/alice/tasks.json"
        );
        assert_eq!(
            store.endpoint(Some("k1")).as_str(),
            "https://db.example.com/users/alice/tasks/k1.json"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_and_token() {
        let store = RemoteStore::new(
            "https://db.example.com/study",
            "users/bob/tasks",
            Some("s3cret".into()),
        )
        .unwrap();
        assert_eq!(
            store.endpoint(Some("k")).as_str(),
            "https://db.example.com/study/users/bob/tasks/k.json?auth=s3cret"
        );
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(RemoteStore::new("not a url", "ns", None).is_err());
        assert!(RemoteStore::new("mailto:someone@example.com", "ns", None).is_err());
    }
}
