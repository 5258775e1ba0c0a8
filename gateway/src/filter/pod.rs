//! Rule for Pods
//!
//! Creation and deletion always pass. An update passes when the spec changed
//! or the current status shows trouble: a restart, an image pull back-off,
//! an eviction or an OOM kill.

use super::container;
use crate::event::{ChangeReason, Event, ResourceObject};
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use std::fmt;
use tracing::{debug, warn};

/// Status signals that make an update worth forwarding, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Restarted,
    ImagePullBackOff,
    Evicted,
    OomKilled,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signal::Restarted => "container restarts",
            Signal::ImagePullBackOff => "ImagePullBackOff",
            Signal::Evicted => "eviction",
            Signal::OomKilled => "OOMKilled container",
        })
    }
}

pub(super) fn should_send(event: &Event) -> bool {
    match event.reason {
        ChangeReason::Created | ChangeReason::Deleted => true,
        ChangeReason::Updated => should_send_update(event),
        ChangeReason::Other(_) => false,
    }
}

fn should_send_update(event: &Event) -> bool {
    let ResourceObject::Pod(pod) = &event.current else {
        warn!(
            name = event.name(),
            "Unable to cast Pod object for filtering, sending event"
        );
        return true;
    };

    let Some(ResourceObject::Pod(old_pod)) = &event.previous else {
        return true;
    };

    let name = event.name();

    if super::spec_changed(&pod.spec, &old_pod.spec) {
        debug!(pod = name, "Pod spec changed, sending update event");
        return true;
    }

    // Only the current status is consulted
    if let Some(signal) = first_signal(pod) {
        debug!(pod = name, signal = %signal, "Pod status is significant, sending update event");
        return true;
    }

    debug!(
        pod = name,
        "Filtering out Pod update event (no significant changes detected)"
    );
    false
}

fn first_signal(pod: &Pod) -> Option<Signal> {
    let status = pod.status.as_ref()?;

    if container::has_restarted(status) {
        Some(Signal::Restarted)
    } else if container::has_image_pull_back_off(status) {
        Some(Signal::ImagePullBackOff)
    } else if is_evicted(status) {
        Some(Signal::Evicted)
    } else if container::has_oom_killed(status) {
        Some(Signal::OomKilled)
    } else {
        None
    }
}

/// Failed with reason `Evicted`, or a message mentioning "evicted"
///
/// The message check is case-sensitive.
fn is_evicted(status: &PodStatus) -> bool {
    let failed_evicted = status.phase.as_deref() == Some("Failed")
        && status.reason.as_deref() == Some("Evicted");

    failed_evicted
        || status
            .message
            .as_deref()
            .is_some_and(|message| message.contains("evicted"))
}
