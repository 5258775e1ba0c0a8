//! Hub - the pipeline between the watch layer and the sinks
//!
//! # Example
//!
//! ```ignore
//! use kubewatch_gateway::{EventFilter, Hub, StdoutEmitter};
//!
//! let (sender, runner) = Hub::new()
//!     .middleware(EventFilter::new(&config.filter))
//!     .emitter(StdoutEmitter::new())
//!     .build();
//!
//! // hand `sender` to the ingestors, then
//! runner.run().await?;
//! ```

use crate::emit::Emitter;
use crate::error::PluginError;
use crate::event::Event;
use crate::metrics;
use crate::middleware::{Middleware, MiddlewareChain};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Default capacity of the ingest channel
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// The Hub - central event pipeline
///
/// ```text
/// EventSender ──► MiddlewareChain ──► Emitters (fan-out)
/// ```
pub struct Hub {
    channel_capacity: usize,
    middleware: MiddlewareChain,
    emitters: Vec<Arc<dyn Emitter>>,
}

impl Hub {
    /// Create a new Hub with default settings
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            middleware: MiddlewareChain::new(),
            emitters: Vec::new(),
        }
    }

    /// Set the ingest channel capacity
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Add a middleware to the processing chain
    ///
    /// Middleware runs in insertion order before events reach the emitters.
    pub fn middleware<M: Middleware + 'static>(mut self, mw: M) -> Self {
        self.middleware.add(mw);
        self
    }

    /// Add an emitter; every admitted event goes to every emitter
    pub fn emitter<E: Emitter + 'static>(mut self, emitter: E) -> Self {
        self.emitters.push(Arc::new(emitter));
        self
    }

    /// Add an emitter (Arc version)
    pub fn emitter_arc(mut self, emitter: Arc<dyn Emitter>) -> Self {
        self.emitters.push(emitter);
        self
    }

    /// Split the hub into its input handle and its runner
    pub fn build(self) -> (EventSender, HubRunner) {
        let (tx, rx) = mpsc::channel(self.channel_capacity);

        let sender = EventSender { tx };

        let runner = HubRunner {
            rx,
            middleware: self.middleware,
            emitters: self.emitters,
        };

        (sender, runner)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for injecting events into the pipeline
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Send an event, waiting for channel capacity
    pub async fn send(&self, event: Event) -> Result<(), PluginError> {
        self.tx
            .send(event)
            .await
            .map_err(|e| PluginError::Send(e.to_string()))
    }

    /// Try to send an event without waiting
    pub fn try_send(&self, event: Event) -> Result<(), PluginError> {
        self.tx
            .try_send(event)
            .map_err(|e| PluginError::Send(e.to_string()))
    }

    /// True once the runner has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Counters for one run of the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub observed: u64,
    pub forwarded: u64,
    pub dropped: u64,
}

/// Hub runner - processes events through the pipeline
pub struct HubRunner {
    rx: mpsc::Receiver<Event>,
    middleware: MiddlewareChain,
    emitters: Vec<Arc<dyn Emitter>>,
}

impl HubRunner {
    /// Run until every sender has been dropped
    ///
    /// Emitter failures are logged and counted; they never stop the
    /// pipeline. Emitters are shut down on exit.
    pub async fn run(mut self) -> Result<HubStats, PluginError> {
        info!(
            emitters = self.emitters.len(),
            middleware = ?self.middleware.names(),
            "Hub started"
        );

        if self.emitters.is_empty() {
            warn!("No emitters registered - admitted events will be discarded");
        }

        let mut stats = HubStats::default();

        while let Some(event) = self.rx.recv().await {
            stats.observed += 1;
            metrics::try_record_observed(&event.kind, event.reason.as_str());
            let kind = event.kind.clone();

            match self.middleware.process(event).await {
                Some(event) => {
                    stats.forwarded += 1;
                    metrics::try_record_forwarded(&kind);
                    self.forward(&event).await;
                }
                None => {
                    stats.dropped += 1;
                    metrics::try_record_dropped(&kind);
                }
            }
        }

        let mut shutdown_error = None;
        for emitter in &self.emitters {
            if let Err(e) = emitter.shutdown().await {
                error!(emitter = emitter.name(), error = %e, "Emitter shutdown failed");
                shutdown_error = Some(e);
            }
        }

        info!(
            observed = stats.observed,
            forwarded = stats.forwarded,
            dropped = stats.dropped,
            "Hub shutdown"
        );

        match shutdown_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    async fn forward(&self, event: &Event) {
        let batch = std::slice::from_ref(event);

        for emitter in &self.emitters {
            match emitter.emit(batch).await {
                Ok(()) => debug!(
                    emitter = emitter.name(),
                    kind = %event.kind,
                    reason = %event.reason,
                    name = event.name(),
                    "Event forwarded"
                ),
                Err(e) => {
                    metrics::try_record_emit_failure(emitter.name());
                    error!(
                        emitter = emitter.name(),
                        error = %e,
                        kind = %event.kind,
                        name = event.name(),
                        "Failed to forward event"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::emit::StdoutEmitter;
    use crate::filter::EventFilter;
    use async_trait::async_trait;
    use k8s_openapi::api::batch::v1::Job;
    use k8s_openapi::api::core::v1::Pod;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingEmitter {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Emitter for FailingEmitter {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn emit(&self, _events: &[Event]) -> Result<(), PluginError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(PluginError::Connection("sink unavailable".into()))
        }

        async fn health(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_hub_builder() {
        let hub = Hub::new()
            .channel_capacity(16)
            .middleware(EventFilter::with_enabled(true))
            .emitter(StdoutEmitter::new());

        assert_eq!(hub.channel_capacity, 16);
        assert_eq!(hub.middleware.len(), 1);
        assert_eq!(hub.emitters.len(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let hub = Hub::new().channel_capacity(0);
        assert_eq!(hub.channel_capacity, 1);
    }

    #[tokio::test]
    async fn test_event_sender() {
        let (sender, runner) = Hub::new().build();

        sender
            .send(Event::created(Pod::default()))
            .await
            .expect("should send");

        drop(runner);
        assert!(sender.is_closed());
        assert!(sender.try_send(Event::created(Pod::default())).is_err());
    }

    #[tokio::test]
    async fn test_runner_counts_decisions() {
        let (sender, runner) = Hub::new()
            .middleware(EventFilter::with_enabled(true))
            .build();

        sender.send(Event::created(Pod::default())).await.unwrap();
        sender
            .send(Event::updated(Pod::default(), Pod::default()))
            .await
            .unwrap();
        sender.send(Event::deleted(Job::default())).await.unwrap();
        drop(sender);

        let stats = runner.run().await.unwrap();
        assert_eq!(
            stats,
            HubStats {
                observed: 3,
                forwarded: 2,
                dropped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_emitter_failure_does_not_stop_pipeline() {
        let failing = Arc::new(FailingEmitter {
            attempts: AtomicUsize::new(0),
        });
        let (sender, runner) = Hub::new()
            .emitter_arc(Arc::clone(&failing) as Arc<dyn Emitter>)
            .build();

        for _ in 0..3 {
            sender.send(Event::created(Job::default())).await.unwrap();
        }
        drop(sender);

        let stats = runner.run().await.unwrap();
        assert_eq!(stats.forwarded, 3);
        assert_eq!(failing.attempts.load(Ordering::SeqCst), 3);
    }
}
