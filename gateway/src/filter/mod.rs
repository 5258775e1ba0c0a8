//! Admission filter for change events
//!
//! Decides, for every observed change, whether it is significant enough to
//! reach the sink. Failures, crashes and evictions always pass; routine churn
//! on Pods, Jobs and Event objects is dropped.
//!
//! # Dispatch
//!
//! ```text
//! should_send(event)
//!   ├─ disabled        ──► true
//!   ├─ kind == "Event" ──► event_resource rule
//!   ├─ kind == "Job"   ──► job rule
//!   ├─ kind == "Pod"   ──► pod rule
//!   └─ anything else   ──► true
//! ```
//!
//! Every rule fails open: a payload that does not have the shape its kind
//! promises is sent, with a warning.
//!
//! # Example
//!
//! ```
//! use k8s_openapi::api::core::v1::Pod;
//! use kubewatch_gateway::config::FilterConfig;
//! use kubewatch_gateway::event::Event;
//! use kubewatch_gateway::filter::EventFilter;
//!
//! let filter = EventFilter::new(&FilterConfig::new(Some("true")));
//! assert!(filter.is_enabled());
//!
//! // Nothing changed between the two snapshots
//! assert!(!filter.should_send(&Event::updated(Pod::default(), Pod::default())));
//! assert!(filter.should_send(&Event::created(Pod::default())));
//! ```

mod container;
mod event_resource;
mod job;
mod pod;

use crate::config::FilterConfig;
use crate::event::{Event, KIND_EVENT, KIND_JOB, KIND_POD};
use crate::middleware::Middleware;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// The admission filter
///
/// Holds a single flag fixed at construction, so one instance can be shared
/// across tasks and threads without locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    enabled: bool,
}

impl EventFilter {
    /// Build the filter from configuration
    ///
    /// An absent or empty setting disables filtering. An unparseable one
    /// also disables it, with a warning: misconfiguration means "send
    /// everything", never "drop everything".
    pub fn new(config: &FilterConfig) -> Self {
        let enabled = match config.advanced_filters.as_deref() {
            None | Some("") => false,
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                warn!(value = raw, "Invalid ADVANCED_FILTERS value, defaulting to false");
                false
            }),
        };

        if enabled {
            info!("Advanced filtering is ENABLED");
        } else {
            info!("Advanced filtering is DISABLED");
        }

        Self { enabled }
    }

    /// Build the filter with the flag set directly
    pub fn with_enabled(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether the per-kind rules are applied
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide whether the event should be forwarded to the sink
    pub fn should_send(&self, event: &Event) -> bool {
        if !self.enabled {
            return true;
        }

        match event.kind.as_str() {
            KIND_EVENT => event_resource::should_send(event),
            KIND_JOB => job::should_send(event),
            KIND_POD => pod::should_send(event),
            _ => true,
        }
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::with_enabled(false)
    }
}

#[async_trait]
impl Middleware for EventFilter {
    fn name(&self) -> &'static str {
        "event-filter"
    }

    async fn process(&self, event: Event) -> Option<Event> {
        if self.should_send(&event) {
            Some(event)
        } else {
            debug!(
                kind = %event.kind,
                reason = %event.reason,
                namespace = event.namespace(),
                name = event.name(),
                "event filtered out"
            );
            None
        }
    }
}

/// Boolean parsing with the conventional accepted spellings
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Deep spec comparison where a missing spec equals the empty one
fn spec_changed<T: PartialEq + Default>(current: &Option<T>, previous: &Option<T>) -> bool {
    match (current, previous) {
        (Some(current), Some(previous)) => current != previous,
        (None, None) => false,
        (Some(spec), None) | (None, Some(spec)) => *spec != T::default(),
    }
}
