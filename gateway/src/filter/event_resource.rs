//! Rule for Kubernetes Event objects
//!
//! Event objects are append-only records, so only their creation matters.
//! New Warning events pass, and so do evictions of any type.

use crate::event::{ChangeReason, Event, ResourceObject};
use tracing::{debug, warn};

const WARNING: &str = "Warning";
const EVICTED: &str = "Evicted";

pub(super) fn should_send(event: &Event) -> bool {
    if event.reason != ChangeReason::Created {
        debug!(
            reason = %event.reason,
            "Filtering out Event resource (only 'Created' events are sent)"
        );
        return false;
    }

    // `type` and `reason` of the Event object itself, not of the change
    let (event_type, event_reason) = match &event.current {
        ResourceObject::CoreEvent(e) => (e.type_.as_deref(), e.reason.as_deref()),
        ResourceObject::EventsV1(e) => (e.type_.as_deref(), e.reason.as_deref()),
        _ => {
            warn!(
                name = event.name(),
                "Unable to determine Event type for filtering, sending event"
            );
            return true;
        }
    };

    if event_reason == Some(EVICTED) {
        debug!(
            name = event.name(),
            "Event resource with reason 'Evicted' will be sent regardless of type"
        );
        return true;
    }

    if event_type != Some(WARNING) {
        debug!(
            event_type = event_type.unwrap_or_default(),
            "Filtering out Event resource (only Warning events are sent)"
        );
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Event as CoreEvent;
    use k8s_openapi::api::events::v1::Event as EventsV1Event;
    use serde_json::json;

    fn core_event(type_: &str, reason: Option<&str>) -> CoreEvent {
        CoreEvent {
            type_: Some(type_.to_string()),
            reason: reason.map(str::to_string),
            ..Default::default()
        }
    }

    fn events_v1_event(type_: &str, reason: Option<&str>) -> EventsV1Event {
        EventsV1Event {
            type_: Some(type_.to_string()),
            reason: reason.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_warning_created_is_sent() {
        assert!(should_send(&Event::created(core_event("Warning", None))));
        assert!(should_send(&Event::created(events_v1_event("Warning", None))));
    }

    #[test]
    fn test_normal_created_is_dropped() {
        assert!(!should_send(&Event::created(core_event("Normal", None))));
        assert!(!should_send(&Event::created(events_v1_event(
            "Normal",
            Some("Scheduled")
        ))));
    }

    #[test]
    fn test_missing_type_is_dropped() {
        assert!(!should_send(&Event::created(CoreEvent::default())));
    }

    #[test]
    fn test_evicted_sent_regardless_of_type() {
        assert!(should_send(&Event::created(core_event(
            "Normal",
            Some("Evicted")
        ))));
        assert!(should_send(&Event::created(events_v1_event(
            "Normal",
            Some("Evicted")
        ))));
    }

    #[test]
    fn test_only_creation_is_considered() {
        for reason in ["Updated", "Deleted", "Synced"] {
            let warning = Event::new("Event", reason, core_event("Warning", None));
            assert!(!should_send(&warning), "{reason}");

            let evicted = Event::new("Event", reason, events_v1_event("Warning", Some("Evicted")));
            assert!(!should_send(&evicted), "{reason}");
        }
    }

    #[test]
    fn test_unrecognized_shape_fails_open() {
        let event = Event::new("Event", "Created", json!({"type": "Normal"}));
        assert!(should_send(&event));
    }
}
