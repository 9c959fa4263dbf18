//! ---
//! seed_section: "03-transport"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Authenticated request/response transport."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
//! The transport collaborator injected into both pipelines.
//!
//! Core pipeline code never builds URLs or auth headers; it issues
//! method/path/body triples through the [`Transport`] trait and
//! inspects the resulting [`ApiResponse`]. The reqwest-backed
//! [`HttpTransport`] owns base-URL joining and the `Authorization`
//! header; tests substitute in-memory fakes.

#![warn(missing_docs)]

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use deskseed_config::TenantConfig;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// HTTP methods the pipelines issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetch a collection page.
    Get,
    /// Create an entity or attach an identity.
    Post,
    /// Remove an entity.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Failures below the HTTP status level: connection, TLS, decoding.
///
/// Non-2xx responses are not transport errors; they are returned as
/// [`ApiResponse`] values so each pipeline can apply its own policy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("request {method} {path} failed: {source}")]
    Request {
        /// Method of the failed request.
        method: Method,
        /// Path of the failed request.
        path: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be read.
    #[error("reading response body for {method} {path} failed: {source}")]
    Body {
        /// Method of the failed request.
        method: Method,
        /// Path of the failed request.
        path: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The supplied path could not be joined onto the base URL.
    #[error("invalid request path {path}: {source}")]
    InvalidPath {
        /// Offending path.
        path: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}

/// Status and parsed JSON body of one remote call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body; `Null` when the body was empty or not JSON.
    pub body: Value,
}

impl ApiResponse {
    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The remote `error` field, stringified, when present.
    pub fn error_code(&self) -> Option<String> {
        match self.body.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    /// The remote `description` field when present.
    pub fn description(&self) -> Option<String> {
        self.body
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}

/// Authenticated request interface consumed by both pipelines.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request and return the status plus parsed body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, TransportError>;
}

/// Reqwest-backed [`Transport`] bound to one tenant.
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    authorization: String,
}

impl HttpTransport {
    /// Build a transport from tenant configuration.
    pub fn new(tenant: &TenantConfig) -> anyhow::Result<Self> {
        Ok(Self::with_base(
            tenant.base_url()?,
            tenant.authorization_header(),
        )?)
    }

    /// Build a transport against an explicit base URL.
    ///
    /// Used by integration tests to point at a local mock server.
    pub fn with_base(base: Url, authorization: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            client,
            base,
            authorization,
        })
    }

    fn join(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|source| TransportError::InvalidPath {
                path: path.to_owned(),
                source,
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.join(path)?;
        let mut request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        }
        .header(reqwest::header::AUTHORIZATION, &self.authorization)
        .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response =
            request
                .send()
                .await
                .map_err(|source| TransportError::Request {
                    method,
                    path: path.to_owned(),
                    source,
                })?;
        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|source| TransportError::Body {
                method,
                path: path.to_owned(),
                source,
            })?;
        let body = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw).unwrap_or(Value::Null)
        };
        debug!(%method, path, status, "remote call completed");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::routing::{delete, post};
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    #[test]
    fn ok_covers_2xx_only() {
        let ok = ApiResponse {
            status: 201,
            body: Value::Null,
        };
        assert!(ok.ok());
        let not_found = ApiResponse {
            status: 404,
            body: Value::Null,
        };
        assert!(!not_found.ok());
    }

    #[test]
    fn error_fields_are_surfaced_verbatim() {
        let response = ApiResponse {
            status: 422,
            body: serde_json::json!({
                "error": "RecordInvalid",
                "description": "Record validation errors",
            }),
        };
        assert_eq!(response.error_code().as_deref(), Some("RecordInvalid"));
        assert_eq!(
            response.description().as_deref(),
            Some("Record validation errors")
        );

        let structured = ApiResponse {
            status: 422,
            body: serde_json::json!({ "error": { "title": "No help" } }),
        };
        assert_eq!(
            structured.error_code().as_deref(),
            Some(r#"{"title":"No help"}"#)
        );
    }

    #[derive(Default)]
    struct Seen {
        authorization: Option<String>,
        body: Option<Value>,
    }

    async fn spawn_echo_server(seen: Arc<Mutex<Seen>>) -> Url {
        let create = {
            let seen = seen.clone();
            move |headers: HeaderMap, Json(body): Json<Value>| {
                let mut guard = seen.lock().unwrap();
                guard.authorization = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                guard.body = Some(body);
                async move {
                    (
                        axum::http::StatusCode::CREATED,
                        Json(serde_json::json!({"organization": {"id": 7, "name": "X"}})),
                    )
                }
            }
        };
        let app = Router::new()
            .route("/api/v2/organizations.json", post(create))
            .route(
                "/api/v2/tickets/:id.json",
                delete(|| async { axum::http::StatusCode::NO_CONTENT }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn http_transport_sends_auth_and_parses_body() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let base = spawn_echo_server(seen.clone()).await;
        let transport = HttpTransport::with_base(base, "Basic abc123".into()).unwrap();

        let body = serde_json::json!({"organization": {"name": "Demo Org 1 (r1)"}});
        let response = transport
            .send(Method::Post, "/api/v2/organizations.json", Some(&body))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert!(response.ok());
        assert_eq!(response.body["organization"]["id"], 7);

        let guard = seen.lock().unwrap();
        assert_eq!(guard.authorization.as_deref(), Some("Basic abc123"));
        assert_eq!(guard.body.as_ref().unwrap(), &body);
    }

    #[tokio::test]
    async fn empty_body_parses_as_null() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let base = spawn_echo_server(seen).await;
        let transport = HttpTransport::with_base(base, "Bearer t".into()).unwrap();

        let response = transport
            .send(Method::Delete, "/api/v2/tickets/9.json", None)
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert!(response.ok());
        assert_eq!(response.body, Value::Null);
    }
}
