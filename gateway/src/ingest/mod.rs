//! Ingest - the watch layer feeding the hub
//!
//! Watches Kubernetes resources and turns raw watch notifications into
//! normalized [`Event`](crate::event::Event)s with the previous object
//! attached to updates.

pub mod k8s;
pub mod tracker;

pub use k8s::{K8sIngestor, K8sIngestorConfig, Watchers};
pub use tracker::ChangeTracker;
