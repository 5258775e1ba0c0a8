//! Normalized change events
//!
//! An [`Event`] is what the watch layer hands to the pipeline: the resource
//! kind, the kind of change, the object after the change and (for updates)
//! the object before it.
//!
//! The object is a closed set of variants. Classification into a variant
//! happens once, at the boundary ([`ResourceObject::from_value`] or the typed
//! `From` conversions), so the admission rules only ever match on a tag.
//!
//! ```text
//! watcher ──► ResourceObject (CoreEvent | EventsV1 | Job | Pod | Other)
//!                     │
//!                     ▼
//!          Event { kind, reason, current, previous }
//! ```

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event as CoreEvent, Node, Pod, Service};
use k8s_openapi::api::events::v1::Event as EventsV1Event;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Kind name of `core/v1` and `events.k8s.io/v1` Event objects
pub const KIND_EVENT: &str = "Event";
/// Kind name of `batch/v1` Job objects
pub const KIND_JOB: &str = "Job";
/// Kind name of `core/v1` Pod objects
pub const KIND_POD: &str = "Pod";

/// What happened to the resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    Created,
    Updated,
    Deleted,
    /// Any other change label, kept verbatim
    Other(String),
}

impl ChangeReason {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeReason::Created => "Created",
            ChangeReason::Updated => "Updated",
            ChangeReason::Deleted => "Deleted",
            ChangeReason::Other(reason) => reason,
        }
    }
}

impl From<&str> for ChangeReason {
    fn from(reason: &str) -> Self {
        match reason {
            "Created" => ChangeReason::Created,
            "Updated" => ChangeReason::Updated,
            "Deleted" => ChangeReason::Deleted,
            other => ChangeReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChangeReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A resource snapshot, classified by shape
///
/// The admission rules never inspect raw payloads. A payload that claims to
/// be a Job but does not deserialize as one ends up as `Other`, and the Job
/// rule then fails open.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceObject {
    /// `core/v1` Event
    CoreEvent(Box<CoreEvent>),
    /// `events.k8s.io/v1` Event
    EventsV1(Box<EventsV1Event>),
    Job(Box<Job>),
    Pod(Box<Pod>),
    /// Any other shape; opaque to the filter
    Other(Box<Value>),
}

impl ResourceObject {
    /// Classify a JSON payload for the given kind
    ///
    /// `Event`, `Job` and `Pod` payloads are deserialized into their typed
    /// shapes. For `Event`, an `events.k8s.io/*` apiVersion selects the
    /// events API shape, anything else the core shape. Payloads that fail to
    /// deserialize, and every other kind, stay `Other`.
    pub fn from_value(kind: &str, value: Value) -> Self {
        let typed = match kind {
            KIND_EVENT => {
                let events_api = value
                    .get("apiVersion")
                    .and_then(Value::as_str)
                    .is_some_and(|v| v.starts_with("events.k8s.io/"));
                if events_api {
                    serde_json::from_value::<EventsV1Event>(value.clone()).map(Self::from)
                } else {
                    serde_json::from_value::<CoreEvent>(value.clone()).map(Self::from)
                }
            }
            KIND_JOB => serde_json::from_value::<Job>(value.clone()).map(Self::from),
            KIND_POD => serde_json::from_value::<Pod>(value.clone()).map(Self::from),
            _ => return Self::Other(Box::new(value)),
        };

        typed.unwrap_or_else(|e| {
            tracing::debug!(kind, error = %e, "payload does not match its kind, keeping it opaque");
            Self::Other(Box::new(value))
        })
    }

    /// Kind name of the object, if it carries one
    pub fn kind(&self) -> Option<&str> {
        match self {
            ResourceObject::CoreEvent(_) | ResourceObject::EventsV1(_) => Some(KIND_EVENT),
            ResourceObject::Job(_) => Some(KIND_JOB),
            ResourceObject::Pod(_) => Some(KIND_POD),
            ResourceObject::Other(value) => value.get("kind").and_then(Value::as_str),
        }
    }

    /// Object name from its metadata
    pub fn name(&self) -> Option<&str> {
        match self {
            ResourceObject::CoreEvent(e) => e.metadata.name.as_deref(),
            ResourceObject::EventsV1(e) => e.metadata.name.as_deref(),
            ResourceObject::Job(j) => j.metadata.name.as_deref(),
            ResourceObject::Pod(p) => p.metadata.name.as_deref(),
            ResourceObject::Other(value) => value.pointer("/metadata/name").and_then(Value::as_str),
        }
    }

    /// Object namespace from its metadata
    pub fn namespace(&self) -> Option<&str> {
        match self {
            ResourceObject::CoreEvent(e) => e.metadata.namespace.as_deref(),
            ResourceObject::EventsV1(e) => e.metadata.namespace.as_deref(),
            ResourceObject::Job(j) => j.metadata.namespace.as_deref(),
            ResourceObject::Pod(p) => p.metadata.namespace.as_deref(),
            ResourceObject::Other(value) => value
                .pointer("/metadata/namespace")
                .and_then(Value::as_str),
        }
    }
}

impl From<CoreEvent> for ResourceObject {
    fn from(event: CoreEvent) -> Self {
        ResourceObject::CoreEvent(Box::new(event))
    }
}

impl From<EventsV1Event> for ResourceObject {
    fn from(event: EventsV1Event) -> Self {
        ResourceObject::EventsV1(Box::new(event))
    }
}

impl From<Job> for ResourceObject {
    fn from(job: Job) -> Self {
        ResourceObject::Job(Box::new(job))
    }
}

impl From<Pod> for ResourceObject {
    fn from(pod: Pod) -> Self {
        ResourceObject::Pod(Box::new(pod))
    }
}

impl From<Value> for ResourceObject {
    fn from(value: Value) -> Self {
        ResourceObject::Other(Box::new(value))
    }
}

/// Kinds the filter has no rule for are carried as opaque JSON
fn opaque<K: Serialize>(obj: &K) -> ResourceObject {
    ResourceObject::Other(Box::new(
        serde_json::to_value(obj).unwrap_or(Value::Null),
    ))
}

impl From<Deployment> for ResourceObject {
    fn from(obj: Deployment) -> Self {
        opaque(&obj)
    }
}

impl From<DaemonSet> for ResourceObject {
    fn from(obj: DaemonSet) -> Self {
        opaque(&obj)
    }
}

impl From<StatefulSet> for ResourceObject {
    fn from(obj: StatefulSet) -> Self {
        opaque(&obj)
    }
}

impl From<Service> for ResourceObject {
    fn from(obj: Service) -> Self {
        opaque(&obj)
    }
}

impl From<Node> for ResourceObject {
    fn from(obj: Node) -> Self {
        opaque(&obj)
    }
}

/// A single observed change to a cluster resource
///
/// # Example
///
/// ```
/// use k8s_openapi::api::core::v1::Pod;
/// use kubewatch_gateway::event::{ChangeReason, Event};
///
/// let evt = Event::updated(Pod::default(), Pod::default());
/// assert_eq!(evt.kind, "Pod");
/// assert_eq!(evt.reason, ChangeReason::Updated);
/// assert!(evt.previous.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Resource kind (`Event`, `Job`, `Pod`, or anything else)
    pub kind: String,

    /// Change type
    pub reason: ChangeReason,

    /// Resource state after the change
    #[serde(rename = "object")]
    pub current: ResourceObject,

    /// Resource state before the change; only set for updates
    #[serde(rename = "old_object", skip_serializing_if = "Option::is_none")]
    pub previous: Option<ResourceObject>,
}

impl Event {
    /// Create an event with an explicit kind and reason
    pub fn new(
        kind: impl Into<String>,
        reason: impl Into<ChangeReason>,
        current: impl Into<ResourceObject>,
    ) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
            current: current.into(),
            previous: None,
        }
    }

    /// Set the pre-change object
    pub fn with_previous(mut self, previous: impl Into<ResourceObject>) -> Self {
        self.previous = Some(previous.into());
        self
    }

    /// A creation event; the kind is taken from the object
    pub fn created(current: impl Into<ResourceObject>) -> Self {
        Self::from_object(ChangeReason::Created, current.into())
    }

    /// An update event; the kind is taken from the current object
    pub fn updated(current: impl Into<ResourceObject>, previous: impl Into<ResourceObject>) -> Self {
        Self::from_object(ChangeReason::Updated, current.into()).with_previous(previous)
    }

    /// A deletion event; the kind is taken from the object
    pub fn deleted(current: impl Into<ResourceObject>) -> Self {
        Self::from_object(ChangeReason::Deleted, current.into())
    }

    fn from_object(reason: ChangeReason, current: ResourceObject) -> Self {
        let kind = current.kind().unwrap_or_default().to_string();
        Self {
            kind,
            reason,
            current,
            previous: None,
        }
    }

    /// Name of the current object, or `""` when unknown
    pub fn name(&self) -> &str {
        self.current.name().unwrap_or_default()
    }

    /// Namespace of the current object, or `""` for cluster-scoped objects
    pub fn namespace(&self) -> &str {
        self.current.namespace().unwrap_or_default()
    }
}
