//! Predicates over container statuses
//!
//! Each predicate looks at init containers and regular containers alike.

use k8s_openapi::api::core::v1::{ContainerState, ContainerStatus, PodStatus};

const IMAGE_PULL_BACK_OFF: &str = "ImagePullBackOff";
const OOM_KILLED: &str = "OOMKilled";

fn all_statuses(status: &PodStatus) -> impl Iterator<Item = &ContainerStatus> {
    status
        .init_container_statuses
        .iter()
        .flatten()
        .chain(status.container_statuses.iter().flatten())
}

fn waiting_reason(state: Option<&ContainerState>) -> Option<&str> {
    state?.waiting.as_ref()?.reason.as_deref()
}

fn terminated_reason(state: Option<&ContainerState>) -> Option<&str> {
    state?.terminated.as_ref()?.reason.as_deref()
}

pub(super) fn has_restarted(status: &PodStatus) -> bool {
    all_statuses(status).any(|c| c.restart_count > 0)
}

pub(super) fn has_image_pull_back_off(status: &PodStatus) -> bool {
    all_statuses(status).any(|c| waiting_reason(c.state.as_ref()) == Some(IMAGE_PULL_BACK_OFF))
}

pub(super) fn has_oom_killed(status: &PodStatus) -> bool {
    all_statuses(status).any(is_oom_killed)
}

/// Current state or the last termination
fn is_oom_killed(status: &ContainerStatus) -> bool {
    terminated_reason(status.state.as_ref()) == Some(OOM_KILLED)
        || terminated_reason(status.last_state.as_ref()) == Some(OOM_KILLED)
}
