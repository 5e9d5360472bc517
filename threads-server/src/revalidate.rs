//! Page-cache revalidation
//!
//! After every mutation the affected page path is handed to a
//! [`Revalidator`]. Delivery is best-effort: failures are logged and never
//! undo the mutation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

/// Path revalidated after profile saves; other paths are ignored for profiles.
pub const PROFILE_EDIT_PATH: &str = "/profile/edit";

#[async_trait]
pub trait Revalidator: Send + Sync + 'static {
    /// Signal that the page at `path` is stale. Never fails.
    async fn revalidate(&self, path: &str);
}

/// Drops every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRevalidator;

#[async_trait]
impl Revalidator for NoopRevalidator {
    async fn revalidate(&self, _path: &str) {}
}

/// Records signals in the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRevalidator;

#[async_trait]
impl Revalidator for LogRevalidator {
    async fn revalidate(&self, path: &str) {
        tracing::debug!(path, "Revalidate");
    }
}

#[derive(Serialize)]
struct RevalidateRequest<'a> {
    path: &'a str,
}

/// POSTs `{"path": ...}` to the presentation layer's revalidation endpoint.
#[derive(Debug, Clone)]
pub struct WebhookRevalidator {
    client: Client,
    endpoint: Url,
}

impl WebhookRevalidator {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Revalidator for WebhookRevalidator {
    async fn revalidate(&self, path: &str) {
        let result = self
            .client
            .post(self.endpoint.clone())
            .json(&RevalidateRequest { path })
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => tracing::debug!(path, "Revalidated"),
            Err(e) => tracing::warn!(path, error = %e, "Revalidation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_webhook_does_not_fail() {
        let endpoint = Url::parse("http://127.0.0.1:1/revalidate").unwrap();
        let revalidator = WebhookRevalidator::new(endpoint, Duration::from_millis(200)).unwrap();

        // Completes without panicking or returning an error
        revalidator.revalidate("/").await;
        assert_eq!(revalidator.endpoint().path(), "/revalidate");
    }

    #[tokio::test]
    async fn noop_and_log_accept_any_path() {
        NoopRevalidator.revalidate("/thread/1").await;
        LogRevalidator.revalidate("/thread/1").await;
    }
}
