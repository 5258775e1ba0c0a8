//! Middleware system for the gateway
//!
//! Middleware sees every event between the watch layer and the sinks and
//! decides whether it continues. The admission filter is one such stage.
//!
//! # Event Flow
//!
//! ```text
//! Ingestors ──► Middleware Chain ──► Emitters
//!                    │
//!                    └─► EventFilter (drop insignificant changes)
//! ```
//!
//! # Example
//!
//! ```ignore
//! struct LoggingMiddleware;
//!
//! #[async_trait]
//! impl Middleware for LoggingMiddleware {
//!     fn name(&self) -> &'static str { "logging" }
//!
//!     async fn process(&self, event: Event) -> Option<Event> {
//!         tracing::info!(kind = %event.kind, "Processing event");
//!         Some(event)  // Pass through
//!     }
//! }
//! ```

use crate::event::Event;
use async_trait::async_trait;

/// Middleware trait for event processing
///
/// # Return Value
///
/// - `Some(event)` - Pass the event on
/// - `None` - Drop the event
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Middleware name for identification and logging
    fn name(&self) -> &'static str;

    /// Process an event
    async fn process(&self, event: Event) -> Option<Event>;
}

/// Middleware applied in insertion order
pub struct MiddlewareChain {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create an empty middleware chain
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the chain
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Process an event through all middleware in order
    ///
    /// Returns `None` as soon as any middleware drops the event.
    pub async fn process(&self, mut event: Event) -> Option<Event> {
        for mw in &self.middlewares {
            event = mw.process(event).await?;
        }
        Some(event)
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Get number of middleware in the chain
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Names of the middleware, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|mw| mw.name()).collect()
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}
