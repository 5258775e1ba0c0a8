//! K8s Ingestor - watch Kubernetes resources and emit change events
//!
//! One watch stream per resource type. Each stream owns a
//! [`ChangeTracker`] so updates carry the object they replaced.

use crate::config::{Config, WatchedResource};
use crate::error::{GatewayError, PluginError};
use crate::event::ResourceObject;
use crate::hub::EventSender;
use crate::ingest::tracker::ChangeTracker;
use crate::metrics;
use futures::{Stream, StreamExt};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event as CoreEvent, Node, Pod, Service};
use k8s_openapi::api::events::v1::Event as EventsV1Event;
use kube::api::Api;
use kube::runtime::WatchStreamExt;
use kube::runtime::watcher;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio::task::JoinSet;

/// Configuration for K8s ingestor
#[derive(Debug, Clone, Default)]
pub struct K8sIngestorConfig {
    /// Namespace to watch (None = all namespaces)
    pub namespace: Option<String>,
    /// Label selector for filtering
    pub label_selector: Option<String>,
    /// Field selector for filtering
    pub field_selector: Option<String>,
}

impl K8sIngestorConfig {
    /// Watch a specific namespace
    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Filter by labels
    pub fn labels(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }

    /// Filter by fields
    pub fn fields(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into());
        self
    }

    fn watcher_config(&self) -> watcher::Config {
        let mut config = watcher::Config::default();
        if let Some(ref labels) = self.label_selector {
            config = config.labels(labels);
        }
        if let Some(ref fields) = self.field_selector {
            config = config.fields(fields);
        }
        config
    }
}

impl From<&Config> for K8sIngestorConfig {
    fn from(config: &Config) -> Self {
        Self {
            namespace: config.namespace.clone(),
            label_selector: config.label_selector.clone(),
            field_selector: None,
        }
    }
}

/// Watches Kubernetes resources and sends their changes to the hub
#[derive(Clone)]
pub struct K8sIngestor {
    client: Client,
    config: K8sIngestorConfig,
}

impl K8sIngestor {
    /// Create with explicit client and config
    pub fn with_config(client: Client, config: K8sIngestorConfig) -> Self {
        Self { client, config }
    }

    /// Watch a namespaced resource type
    ///
    /// Runs until the hub stops accepting events.
    pub async fn watch_namespaced<K>(&self, sender: EventSender) -> Result<(), PluginError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + 'static,
        ResourceObject: From<K>,
    {
        let api: Api<K> = match &self.config.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let stream = watcher::watcher(api, self.config.watcher_config()).default_backoff();
        run_watch(stream, sender, self.config.namespace.as_deref()).await
    }

    /// Watch a cluster-scoped resource type; the namespace is ignored
    pub async fn watch_cluster<K>(&self, sender: EventSender) -> Result<(), PluginError>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + 'static,
        ResourceObject: From<K>,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let stream = watcher::watcher(api, self.config.watcher_config()).default_backoff();
        run_watch(stream, sender, None).await
    }

    /// Start one background watch per resource type
    pub fn spawn_watchers(&self, resources: &[WatchedResource], sender: EventSender) -> Watchers {
        let mut watchers = Watchers::new();
        for &resource in resources {
            let ingestor = self.clone();
            let sender = sender.clone();
            watchers.spawn(resource, async move { ingestor.watch(resource, sender).await });
        }
        watchers
    }

    async fn watch(&self, resource: WatchedResource, sender: EventSender) -> Result<(), PluginError> {
        match resource {
            WatchedResource::Pods => self.watch_namespaced::<Pod>(sender).await,
            WatchedResource::Jobs => self.watch_namespaced::<Job>(sender).await,
            WatchedResource::Events => self.watch_namespaced::<CoreEvent>(sender).await,
            WatchedResource::EventsV1 => self.watch_namespaced::<EventsV1Event>(sender).await,
            WatchedResource::Deployments => self.watch_namespaced::<Deployment>(sender).await,
            WatchedResource::DaemonSets => self.watch_namespaced::<DaemonSet>(sender).await,
            WatchedResource::StatefulSets => self.watch_namespaced::<StatefulSet>(sender).await,
            WatchedResource::Services => self.watch_namespaced::<Service>(sender).await,
            WatchedResource::Nodes => self.watch_cluster::<Node>(sender).await,
        }
    }
}

/// Running watch tasks
///
/// A watch that stops on its own leaves its resource unwatched, so the
/// owner polls [`Watchers::next_failure`] alongside the hub.
pub struct Watchers {
    tasks: JoinSet<(WatchedResource, Result<(), PluginError>)>,
}

impl Watchers {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    /// Run `watch` for `resource` in the background
    pub fn spawn<F>(&mut self, resource: WatchedResource, watch: F)
    where
        F: Future<Output = Result<(), PluginError>> + Send + 'static,
    {
        self.tasks.spawn(async move { (resource, watch.await) });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next watch to fail
    ///
    /// Watches that finish cleanly (the hub closed) are skipped. Returns
    /// `None` once every watch has finished without error.
    pub async fn next_failure(&mut self) -> Option<GatewayError> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((resource, Ok(()))) => {
                    tracing::debug!(resource = %resource, "Watch finished");
                }
                Ok((resource, Err(e))) => {
                    tracing::error!(resource = %resource, error = %e, "Watch failed");
                    return Some(e.in_plugin(resource.as_str()));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Watch task aborted or panicked");
                    return Some(PluginError::Watch(format!("watch task died: {e}")).in_plugin("k8s"));
                }
            }
        }
        None
    }

    /// Abort every watch and wait for the tasks to go away
    ///
    /// Dropping the tasks drops their senders, which lets the hub drain.
    pub async fn shutdown(&mut self) {
        self.tasks.shutdown().await;
    }
}

impl Default for Watchers {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one watch stream into the hub
///
/// Returns `Ok` when the hub closes its channel. Watch errors are retried
/// by the backoff layer; the stream itself ending is an error.
async fn run_watch<K, S>(
    stream: S,
    sender: EventSender,
    namespace: Option<&str>,
) -> Result<(), PluginError>
where
    K: Resource<DynamicType = ()> + Clone,
    ResourceObject: From<K>,
    S: Stream<Item = Result<watcher::Event<K>, watcher::Error>>,
{
    let kind = K::kind(&()).to_string();
    let mut tracker = ChangeTracker::<K>::new();

    tokio::pin!(stream);

    tracing::info!(kind = %kind, namespace = ?namespace, "K8s ingestor started watching");
    metrics::try_watch_started();

    let result = loop {
        let Some(notification) = stream.next().await else {
            break Err(PluginError::Watch(format!("{kind} watch stream ended")));
        };

        match notification {
            Ok(notification) => {
                let Some(event) = tracker.handle(notification) else {
                    continue;
                };
                if sender.send(event).await.is_err() {
                    tracing::debug!(kind = %kind, "K8s ingestor channel closed");
                    break Ok(());
                }
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "K8s watcher error");
            }
        }
    };

    metrics::try_watch_stopped();
    tracing::info!(kind = %kind, tracked = tracker.len(), "K8s ingestor stopped");
    result
}
