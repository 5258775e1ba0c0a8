//! Emitter system for the gateway
//!
//! Emitters deliver admitted events to the sink (an HTTP receiver, stdout).
//! All registered emitters receive every admitted event in a fan-out pattern.

pub mod stdout;
pub mod webhook;

use crate::error::PluginError;
use crate::event::Event;
use async_trait::async_trait;

pub use stdout::StdoutEmitter;
pub use webhook::WebhookEmitter;

/// Emitter trait - sends Events to a destination
///
/// # Example
///
/// ```ignore
/// struct AlertManagerEmitter {
///     client: AlertClient,
/// }
///
/// #[async_trait]
/// impl Emitter for AlertManagerEmitter {
///     fn name(&self) -> &'static str { "alertmanager" }
///
///     async fn emit(&self, events: &[Event]) -> Result<(), PluginError> {
///         self.client.post_alerts(events).await?;
///         Ok(())
///     }
///
///     async fn health(&self) -> bool {
///         self.client.ping().await.is_ok()
///     }
/// }
/// ```
#[async_trait]
pub trait Emitter: Send + Sync {
    /// Emitter name for identification and logging
    fn name(&self) -> &'static str;

    /// Emit events to the destination
    async fn emit(&self, events: &[Event]) -> Result<(), PluginError>;

    /// Health check for the destination
    ///
    /// Returns true if the destination is healthy and accepting events.
    async fn health(&self) -> bool;

    /// Graceful shutdown
    ///
    /// Called when the gateway is shutting down to flush buffers, close connections, etc.
    async fn shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }
}
