//! HTTP Webhook emitter
//!
//! POSTs admitted events as JSON to the sink endpoint.
//!
//! # Payload
//!
//! ```json
//! {
//!   "events": [
//!     {
//!       "kind": "Pod",
//!       "reason": "Updated",
//!       "namespace": "prod",
//!       "name": "web-0",
//!       "object": { "...": "..." },
//!       "old_object": { "...": "..." }
//!     }
//!   ]
//! }
//! ```
//!
//! # Example
//!
//! ```ignore
//! let emitter = WebhookEmitter::new("https://sink.example.com/api/handle")?
//!     .header("Authorization", "Bearer token123");
//! let hub = Hub::new().emitter(emitter);
//! ```

use crate::emit::Emitter;
use crate::error::PluginError;
use crate::event::{ChangeReason, Event, ResourceObject};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Serialize)]
struct WebhookPayload<'a> {
    events: Vec<EventJson<'a>>,
}

#[derive(Serialize)]
struct EventJson<'a> {
    kind: &'a str,
    reason: &'a ChangeReason,
    namespace: &'a str,
    name: &'a str,
    object: &'a ResourceObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_object: Option<&'a ResourceObject>,
}

impl<'a> From<&'a Event> for EventJson<'a> {
    fn from(e: &'a Event) -> Self {
        Self {
            kind: &e.kind,
            reason: &e.reason,
            namespace: e.namespace(),
            name: e.name(),
            object: &e.current,
            old_object: e.previous.as_ref(),
        }
    }
}

/// HTTP Webhook emitter - POSTs events as JSON
pub struct WebhookEmitter {
    client: Client,
    url: String,
    health_url: Option<String>,
    headers: HashMap<String, String>,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

impl WebhookEmitter {
    /// Create a new WebhookEmitter for the given URL
    ///
    /// Uses default timeouts: 30s request timeout, 10s connection timeout
    ///
    /// # Errors
    /// Returns `PluginError::Init` if the HTTP client cannot be created
    pub fn new(url: impl Into<String>) -> Result<Self, PluginError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PluginError::Init(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            health_url: None,
            headers: HashMap::new(),
        })
    }

    /// Set a custom health check URL
    ///
    /// By default, health checks use HEAD request to the emit URL.
    pub fn health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = Some(url.into());
        self
    }

    /// Add a custom header to all requests
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl Emitter for WebhookEmitter {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn emit(&self, events: &[Event]) -> Result<(), PluginError> {
        if events.is_empty() {
            return Ok(());
        }

        let payload = WebhookPayload {
            events: events.iter().map(EventJson::from).collect(),
        };

        let mut request = self.client.post(&self.url).json(&payload);

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    debug!(
                        url = %self.url,
                        count = events.len(),
                        status = %response.status(),
                        "Webhook delivered"
                    );
                    Ok(())
                } else {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    error!(
                        url = %self.url,
                        status = %status,
                        body = %body,
                        "Webhook request failed"
                    );
                    Err(PluginError::Send(format!("Webhook returned {status}: {body}")))
                }
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "Webhook connection failed");
                Err(PluginError::Connection(format!(
                    "Failed to connect to {}: {}",
                    self.url, e
                )))
            }
        }
    }

    async fn health(&self) -> bool {
        let url = self.health_url.as_ref().unwrap_or(&self.url);

        match self.client.head(url).send().await {
            Ok(response) => {
                // Reachable unless the server itself errors
                let healthy = !response.status().is_server_error();
                if !healthy {
                    debug!(
                        url = %url,
                        status = %response.status(),
                        "Health check returned server error"
                    );
                }
                healthy
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Health check failed");
                false
            }
        }
    }
}
