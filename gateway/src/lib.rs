//! Kubewatch gateway - Kubernetes change events with advanced filtering
//!
//! Watches cluster resources, decides per change whether it is worth
//! reporting, and forwards the survivors to a sink.
//!
//! # Architecture
//!
//! ```text
//! Watches (ingest) ──► Hub (EventFilter middleware) ──► Emitters
//! ```
//!
//! The filter is plain middleware; sinks are pluggable via [`Emitter`].

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod emit;
pub mod error;
pub mod event;
pub mod filter;
pub mod hub;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod metrics_server;
pub mod middleware;

pub use config::{Config, FilterConfig, WatchedResource};
pub use emit::{Emitter, StdoutEmitter, WebhookEmitter};
pub use error::{GatewayError, PluginError, Result};
pub use event::{ChangeReason, Event, ResourceObject};
pub use filter::EventFilter;
pub use hub::{EventSender, Hub, HubRunner, HubStats};
pub use ingest::K8sIngestor;
pub use middleware::{Middleware, MiddlewareChain};
