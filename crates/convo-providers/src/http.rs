//! Generic HTTP `VectorStoreProvider` adapter (spec §6 "External vector
//! store contract"). Speaks a minimal JSON protocol against a remote
//! semantic-index service; the exact service is out of scope, so the
//! wire shape here is deliberately small: one `POST /points` and one
//! `GET /points/count`.

use async_trait::async_trait;
use convo_domain::error::{Error, Result};
use convo_domain::ports::{IndexableContent, VectorStoreProvider};
use convo_domain::value_objects::{HostId, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct IndexRequest<'a> {
    task_id: &'a str,
    text: &'a str,
    content_hash: &'a str,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// Adapts a remote HTTP semantic-index service to the `VectorStoreProvider`
/// port. Authentication, retries beyond the Indexing Pipeline's own backoff,
/// and the embedding model itself are all the remote service's concern.
#[derive(Debug, Clone)]
pub struct HttpVectorStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVectorStore {
    /// Build an adapter targeting `base_url` (no trailing slash expected).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    fn classify(status: reqwest::StatusCode, message: String) -> Error {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Error::PermanentRemote { message: format!("authentication rejected: {message}") }
            }
            reqwest::StatusCode::NOT_FOUND => Error::PermanentRemote { message: format!("not found: {message}") },
            reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                Error::PermanentRemote { message: format!("request rejected: {message}") }
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                Error::TransientRemote { message: format!("rate limited: {message}") }
            }
            status if status.is_server_error() => {
                Error::TransientRemote { message: format!("remote service error {status}: {message}") }
            }
            status => Error::TransientRemote { message: format!("unexpected status {status}: {message}") },
        }
    }
}

#[async_trait]
impl VectorStoreProvider for HttpVectorStore {
    async fn index(&self, task_id: &TaskId, content: &IndexableContent) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/points", self.base_url))
            .json(&IndexRequest {
                task_id: task_id.as_str(),
                text: &content.text,
                content_hash: &content.content_hash,
            })
            .send()
            .await
            .map_err(|e| Error::TransientRemote { message: e.to_string() })?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let err = Self::classify(status, body);
        tracing::warn!(task_id = %task_id, error = %err, "remote indexing call failed");
        Err(err)
    }

    async fn count_points_by_host(&self, host_id: &HostId) -> Result<u64> {
        let response = self
            .client
            .get(format!("{}/points/count", self.base_url))
            .query(&[("host_id", host_id.as_str())])
            .send()
            .await
            .map_err(|e| Error::TransientRemote { message: e.to_string() })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status, body));
        }

        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| Error::TransientRemote { message: format!("malformed count response: {e}") })?;
        Ok(parsed.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_auth_failures_as_permanent() {
        let err = HttpVectorStore::classify(reqwest::StatusCode::UNAUTHORIZED, "bad token".to_owned());
        assert!(matches!(err, Error::PermanentRemote { .. }));
    }

    #[test]
    fn classifies_rate_limit_as_transient() {
        let err = HttpVectorStore::classify(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".to_owned());
        assert!(matches!(err, Error::TransientRemote { .. }));
    }

    #[test]
    fn classifies_server_error_as_transient() {
        let err = HttpVectorStore::classify(reqwest::StatusCode::BAD_GATEWAY, "upstream down".to_owned());
        assert!(matches!(err, Error::TransientRemote { .. }));
    }

    #[test]
    fn classifies_not_found_as_permanent() {
        let err = HttpVectorStore::classify(reqwest::StatusCode::NOT_FOUND, "no such collection".to_owned());
        assert!(matches!(err, Error::PermanentRemote { .. }));
    }
}
