//! ---
//! seed_section: "05-reclamation"
//! seed_subsection: "module"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Lazy paginated listing of remote collections."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use serde_json::Value;
use tracing::debug;
use url::Url;

use deskseed_transport::{Method, Transport};

use crate::{EntityKind, ReclaimError};

/// Lazy, restartable sequence of collection pages.
///
/// Each call to [`PagedLister::next_page`] fetches one page and
/// advances the cursor taken from the remote `next_page` field; the
/// sequence terminates when the remote stops supplying one. A cursor
/// identical to the page just fetched also terminates the sequence,
/// which guards against a remote that echoes the current page forever.
pub struct PagedLister<'a> {
    transport: &'a dyn Transport,
    kind: EntityKind,
    cursor: Option<String>,
    done: bool,
}

impl<'a> PagedLister<'a> {
    /// Start a fresh listing of the given collection.
    pub fn new(transport: &'a dyn Transport, kind: EntityKind) -> Self {
        Self {
            transport,
            kind,
            cursor: None,
            done: false,
        }
    }

    /// Rewind to the first page.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.done = false;
    }

    /// Fetch the next page of entities, or `None` once exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Value>>, ReclaimError> {
        if self.done {
            return Ok(None);
        }
        let path = self
            .cursor
            .clone()
            .unwrap_or_else(|| self.kind.collection_path().to_owned());

        let response = self
            .transport
            .send(Method::Get, &path, None)
            .await
            .map_err(|source| ReclaimError::Transport {
                action: "listing",
                kind: self.kind,
                source,
            })?;
        if !response.ok() {
            return Err(ReclaimError::ListRejected {
                kind: self.kind,
                status: response.status,
                body: response.body,
            });
        }

        let entities = response
            .body
            .get(self.kind.collection_key())
            .and_then(Value::as_array)
            .cloned()
            .ok_or(ReclaimError::Malformed {
                kind: self.kind,
                field: self.kind.collection_key(),
            })?;

        match response.body.get("next_page").and_then(Value::as_str) {
            Some(next) => {
                let next = reduce_to_path(next);
                if next == path {
                    self.done = true;
                } else {
                    self.cursor = Some(next);
                }
            }
            None => self.done = true,
        }

        debug!(kind = %self.kind, count = entities.len(), done = self.done, "page listed");
        Ok(Some(entities))
    }

    /// Drain every remaining page into one vector.
    pub async fn collect_all(&mut self) -> Result<Vec<Value>, ReclaimError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }
}

/// The remote reports `next_page` as an absolute URL; the transport
/// wants a path relative to the tenant base.
fn reduce_to_path(next: &str) -> String {
    match Url::parse(next) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_owned(),
        },
        Err(_) => next.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deskseed_transport::{ApiResponse, TransportError};
    use serde_json::json;
    use std::sync::Mutex;

    struct PagedFake {
        pages: Vec<Value>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for PagedFake {
        async fn send(
            &self,
            _method: Method,
            path: &str,
            _body: Option<&Value>,
        ) -> Result<ApiResponse, TransportError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(path.to_owned());
            let body = self.pages[calls.len() - 1].clone();
            Ok(ApiResponse { status: 200, body })
        }
    }

    #[test]
    fn absolute_next_page_is_reduced() {
        assert_eq!(
            reduce_to_path("https://acme.zendesk.com/api/v2/tickets.json?page=2"),
            "/api/v2/tickets.json?page=2"
        );
        assert_eq!(reduce_to_path("/api/v2/tickets.json?page=3"), "/api/v2/tickets.json?page=3");
    }

    #[tokio::test]
    async fn follows_next_page_until_exhausted() {
        let fake = PagedFake {
            pages: vec![
                json!({
                    "tickets": [{"id": 1}, {"id": 2}],
                    "next_page": "https://acme.zendesk.com/api/v2/tickets.json?page=2",
                }),
                json!({ "tickets": [{"id": 3}], "next_page": null }),
            ],
            calls: Mutex::new(Vec::new()),
        };

        let mut lister = PagedLister::new(&fake, EntityKind::Ticket);
        let all = lister.collect_all().await.unwrap();
        assert_eq!(all.len(), 3);

        let calls = fake.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "/api/v2/tickets.json".to_owned(),
                "/api/v2/tickets.json?page=2".to_owned()
            ]
        );
    }

    #[tokio::test]
    async fn repeated_cursor_terminates() {
        let page = json!({
            "organizations": [{"id": 1}],
            "next_page": "https://acme.zendesk.com/api/v2/organizations.json",
        });
        let fake = PagedFake {
            pages: vec![page.clone(), page],
            calls: Mutex::new(Vec::new()),
        };

        let mut lister = PagedLister::new(&fake, EntityKind::Organization);
        let all = lister.collect_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(fake.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_restarts_from_first_page() {
        let page = json!({ "users": [{"id": 1}] });
        let fake = PagedFake {
            pages: vec![page.clone(), page],
            calls: Mutex::new(Vec::new()),
        };

        let mut lister = PagedLister::new(&fake, EntityKind::User);
        assert_eq!(lister.collect_all().await.unwrap().len(), 1);
        lister.reset();
        assert_eq!(lister.collect_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_collection_key_is_malformed() {
        let fake = PagedFake {
            pages: vec![json!({ "unexpected": [] })],
            calls: Mutex::new(Vec::new()),
        };
        let mut lister = PagedLister::new(&fake, EntityKind::Ticket);
        let err = lister.next_page().await.unwrap_err();
        assert!(matches!(err, ReclaimError::Malformed { .. }));
    }
}
