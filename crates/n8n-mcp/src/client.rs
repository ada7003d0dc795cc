//! One-shot HTTP round trips against the n8n REST API.
//!
//! Every call resolves the base URL and headers from the environment, sends exactly one request,
//! and normalizes the response body into JSON:
//! - empty body → `None`
//! - valid JSON → the decoded value, unmodified
//! - anything else → `{"raw": "<text>"}`
//!
//! Non-2xx statuses become [`N8nError::RemoteApi`] with the normalized body attached.

use crate::config::{self, EnvSource};
use crate::error::{N8nError, Result};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const HEALTH_PATH: &str = "/healthz";

/// Result of the unauthenticated health probe.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub url: String,
    pub status: u16,
    pub ok: bool,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct N8nClient {
    http: Client,
    env: EnvSource,
}

impl N8nClient {
    #[must_use]
    pub fn new(env: EnvSource) -> Self {
        Self {
            http: Client::new(),
            env,
        }
    }

    /// Base URL as currently configured.
    #[must_use]
    pub fn base_url(&self) -> String {
        config::base_url(&self.env)
    }

    /// Send an authenticated request to `{base_url}{path}`.
    ///
    /// `body` is serialized as JSON only when present; otherwise no body is sent.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`N8nError::Configuration`] if credentials are missing (nothing is sent)
    /// - [`N8nError::RemoteApi`] on a non-2xx status
    /// - [`N8nError::Transport`] if the request could not be completed
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let url = format!("{}{path}", self.base_url());
        let headers = config::auth_headers(&self.env)?;

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_string(body)?);
        }

        let response = request.send().await.inspect_err(|e| {
            warn!(%method, %path, error = %crate::error::sanitize_reqwest_error(e), "n8n request failed");
        })?;
        let status = response.status();
        let text = response.text().await?;
        let data = decode_body(&text);

        debug!(%method, %path, status = status.as_u16(), "n8n response");

        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();
            warn!(%method, %path, status = status.as_u16(), "n8n API returned an error status");
            return Err(N8nError::RemoteApi {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                status_text,
                details: data,
            });
        }

        Ok(data)
    }

    /// Probe `GET {base_url}/healthz` without credentials.
    ///
    /// Never fails on a non-2xx status; the status is reported in the result instead.
    ///
    /// # Errors
    ///
    /// Returns [`N8nError::Transport`] if no response could be obtained.
    pub async fn health(&self) -> Result<HealthReport> {
        let url = format!("{}{HEALTH_PATH}", self.base_url());
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(%url, status = status.as_u16(), "n8n health probe");

        Ok(HealthReport {
            url,
            status: status.as_u16(),
            ok: status.is_success(),
            body,
        })
    }
}

fn decode_body(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{API_KEY_VAR, BASE_URL_VAR};
    use n8n_mcp_test_support::MockUpstream;

    fn client_for(mock: &MockUpstream) -> N8nClient {
        N8nClient::new(EnvSource::fixed([
            (BASE_URL_VAR, format!("{}/", mock.base_url())),
            (API_KEY_VAR, "test-key".to_string()),
        ]))
    }

    #[test]
    fn decode_body_distinguishes_empty_json_and_raw() {
        assert_eq!(decode_body(""), None);
        assert_eq!(decode_body("null"), Some(Value::Null));
        assert_eq!(decode_body(r#"{"a":1}"#), Some(json!({"a": 1})));
        assert_eq!(
            decode_body("<html>bad gateway</html>"),
            Some(json!({"raw": "<html>bad gateway</html>"}))
        );
    }

    #[tokio::test]
    async fn success_returns_decoded_body_unmodified() {
        let mock = MockUpstream::start().await.expect("mock");
        let payload = json!({
            "data": [{"id": "1", "name": "Sync", "active": true, "tags": []}],
            "nextCursor": null
        });
        mock.respond("GET", "/api/v1/workflows", 200, payload.to_string());

        let data = client_for(&mock)
            .request(Method::GET, "/api/v1/workflows", None)
            .await
            .expect("request");
        assert_eq!(data, Some(payload));

        let reqs = mock.requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].path, "/api/v1/workflows");
        assert_eq!(reqs[0].header("x-n8n-api-key"), Some("test-key"));
        assert_eq!(reqs[0].header("accept"), Some("application/json"));
        assert_eq!(reqs[0].body, "");
    }

    #[tokio::test]
    async fn body_is_sent_as_json_only_when_given() {
        let mock = MockUpstream::start().await.expect("mock");
        mock.respond("POST", "/api/v1/workflows", 200, "{}");

        client_for(&mock)
            .request(
                Method::POST,
                "/api/v1/workflows",
                Some(&json!({"name": "New"})),
            )
            .await
            .expect("request");

        let reqs = mock.requests();
        assert_eq!(reqs[0].body, r#"{"name":"New"}"#);
        assert_eq!(reqs[0].header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn empty_success_body_is_none() {
        let mock = MockUpstream::start().await.expect("mock");
        mock.respond("POST", "/api/v1/workflows/5/activate", 200, "");

        let data = client_for(&mock)
            .request(Method::POST, "/api/v1/workflows/5/activate", None)
            .await
            .expect("request");
        assert_eq!(data, None);
    }

    #[tokio::test]
    async fn non_success_status_is_remote_api_error_with_details() {
        let mock = MockUpstream::start().await.expect("mock");
        mock.respond(
            "GET",
            "/api/v1/workflows/42",
            404,
            r#"{"message":"Not Found"}"#,
        );

        let err = client_for(&mock)
            .request(Method::GET, "/api/v1/workflows/42", None)
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("GET"), "{msg}");
        assert!(msg.contains("/api/v1/workflows/42"), "{msg}");
        assert!(msg.contains("404"), "{msg}");
        match err {
            N8nError::RemoteApi {
                status, details, ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(details, Some(json!({"message": "Not Found"})));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_raw() {
        let mock = MockUpstream::start().await.expect("mock");
        mock.respond("GET", "/api/v1/executions", 502, "upstream exploded");

        let err = client_for(&mock)
            .request(Method::GET, "/api/v1/executions", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502 Bad Gateway"));
        assert_eq!(err.details(), Some(&json!({"raw": "upstream exploded"})));
    }

    #[tokio::test]
    async fn missing_api_key_sends_nothing() {
        let mock = MockUpstream::start().await.expect("mock");
        let client = N8nClient::new(EnvSource::fixed([(BASE_URL_VAR, mock.base_url())]));

        let err = client
            .request(Method::GET, "/api/v1/workflows", None)
            .await
            .unwrap_err();
        assert!(matches!(err, N8nError::Configuration(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn health_is_unauthenticated_and_reports_failures() {
        let mock = MockUpstream::start().await.expect("mock");
        mock.respond("GET", "/healthz", 503, r#"{"status":"error"}"#);
        let client = N8nClient::new(EnvSource::fixed([(BASE_URL_VAR, mock.base_url())]));

        let report = client.health().await.expect("health");
        assert_eq!(
            report,
            HealthReport {
                url: format!("{}/healthz", mock.base_url()),
                status: 503,
                ok: false,
                body: r#"{"status":"error"}"#.to_string(),
            }
        );
        assert_eq!(mock.requests()[0].header("x-n8n-api-key"), None);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_transport_error() {
        let client = N8nClient::new(EnvSource::fixed([
            (BASE_URL_VAR, "http://127.0.0.1:1"),
            (API_KEY_VAR, "k"),
        ]));
        let err = client
            .request(Method::GET, "/api/v1/workflows", None)
            .await
            .unwrap_err();
        assert!(matches!(err, N8nError::Transport(_)));
    }
}
