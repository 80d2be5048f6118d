use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::AppError;

/// Decoded answer from the engine.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl EngineResponse {
    /// The body on success; any other status means the backend cannot serve us.
    pub fn into_success(self, context: &str) -> Result<Value, AppError> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(AppError::SearchUnavailable(format!(
                "{context} returned {}: {}",
                self.status, self.body
            )))
        }
    }

    /// Whether the engine reported a missing index or document.
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// JSON-over-HTTP client shared by the Elasticsearch adapters.
///
/// Every request carries a timeout. Connection failures, timeouts and 5xx
/// answers are retried up to `max_retries` times with a linear backoff; all
/// requests issued by the adapters are idempotent.
pub struct EngineTransport {
    client: reqwest::Client,
    base: Url,
    max_retries: u32,
}

impl EngineTransport {
    pub fn new(base_url: &str, timeout: Duration, max_retries: u32) -> Result<Self, AppError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid search URL '{base_url}': {e}")))?;

        // Url::join replaces the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base,
            max_retries,
        })
    }

    /// Send a request to `path` (relative to the base URL).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<EngineResponse, AppError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| AppError::Internal(format!("Invalid engine path '{path}': {e}")))?;

        let mut attempt: u32 = 0;
        loop {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) if response.status().is_server_error() && attempt < self.max_retries => {
                    tracing::warn!(%url, status = %response.status(), attempt, "Search engine error, retrying");
                }
                Ok(response) => return decode(&url, response).await,
                Err(e) if attempt < self.max_retries => {
                    tracing::warn!(%url, attempt, "Search engine request failed, retrying: {e}");
                }
                Err(e) => {
                    return Err(AppError::SearchUnavailable(format!(
                        "Request to {url} failed: {e}"
                    )))
                }
            }

            attempt += 1;
            tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
        }
    }
}

async fn decode(url: &Url, response: reqwest::Response) -> Result<EngineResponse, AppError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::SearchUnavailable(format!("Failed to read response from {url}: {e}")))?;

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::SearchUnavailable(format!("Malformed response from {url}: {e}")))?
    };

    Ok(EngineResponse { status, body })
}


#[cfg(test)]
mod tests {
    use super::fake_engine::{start, Canned};
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_success_body_is_decoded() {
        let engine = start(vec![Canned {
            path_fragment: "_count",
            status: 200,
            body: json!({ "count": 3 }),
        }])
        .await;

        let transport = EngineTransport::new(&engine.base_url, Duration::from_secs(2), 0).unwrap();
        let response = transport
            .send(Method::POST, "pages/_count", Some(&json!({ "query": {} })))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["count"], 3);

        let recorded = engine.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].path, "/pages/_count");
        assert_eq!(recorded[0].body, json!({ "query": {} }));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_then_surfaced() {
        let engine = start(vec![Canned {
            path_fragment: "_search",
            status: 503,
            body: json!({ "error": "unavailable" }),
        }])
        .await;

        let transport = EngineTransport::new(&engine.base_url, Duration::from_secs(2), 2).unwrap();
        let response = transport
            .send(Method::POST, "pages/_search", None)
            .await
            .unwrap();

        assert_eq!(engine.requests().len(), 3);
        assert!(matches!(
            response.into_success("search"),
            Err(AppError::SearchUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_unavailable() {
        // Port 9 (discard) is closed on test machines.
        let transport = EngineTransport::new("http://127.0.0.1:9", Duration::from_millis(500), 1).unwrap();
        let result = transport.send(Method::GET, "pages", None).await;
        assert!(matches!(result, Err(AppError::SearchUnavailable(_))));
    }

    #[test]
    fn test_base_path_is_preserved() {
        let transport =
            EngineTransport::new("http://search.internal:9200/es", Duration::from_secs(1), 0).unwrap();
        assert_eq!(transport.base.as_str(), "http://search.internal:9200/es/");
        assert_eq!(
            transport.base.join("pages/_doc/1").unwrap().as_str(),
            "http://search.internal:9200/es/pages/_doc/1"
        );
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let result = EngineTransport::new("not a url", Duration::from_secs(1), 0);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
