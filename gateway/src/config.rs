//! Configuration for the kubewatch gateway
//!
//! Everything is read once at startup from environment variables. The
//! admission filter only receives its own [`FilterConfig`].

use crate::error::{GatewayError, Result};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Admission filter settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Raw `ADVANCED_FILTERS` value; parsed by the filter itself
    pub advanced_filters: Option<String>,
}

impl FilterConfig {
    pub fn new(advanced_filters: Option<&str>) -> Self {
        Self {
            advanced_filters: advanced_filters.map(str::to_string),
        }
    }
}

/// Resource types the gateway can watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedResource {
    Pods,
    Jobs,
    /// `core/v1` Events
    Events,
    /// `events.k8s.io/v1` Events
    EventsV1,
    Deployments,
    DaemonSets,
    StatefulSets,
    Services,
    Nodes,
}

impl WatchedResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchedResource::Pods => "pods",
            WatchedResource::Jobs => "jobs",
            WatchedResource::Events => "events",
            WatchedResource::EventsV1 => "events.k8s.io",
            WatchedResource::Deployments => "deployments",
            WatchedResource::DaemonSets => "daemonsets",
            WatchedResource::StatefulSets => "statefulsets",
            WatchedResource::Services => "services",
            WatchedResource::Nodes => "nodes",
        }
    }
}

impl FromStr for WatchedResource {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pods" | "pod" => Ok(WatchedResource::Pods),
            "jobs" | "job" => Ok(WatchedResource::Jobs),
            "events" | "event" => Ok(WatchedResource::Events),
            "events.k8s.io" => Ok(WatchedResource::EventsV1),
            "deployments" | "deployment" => Ok(WatchedResource::Deployments),
            "daemonsets" | "daemonset" => Ok(WatchedResource::DaemonSets),
            "statefulsets" | "statefulset" => Ok(WatchedResource::StatefulSets),
            "services" | "service" => Ok(WatchedResource::Services),
            "nodes" | "node" => Ok(WatchedResource::Nodes),
            other => Err(GatewayError::Config(format!(
                "unknown resource in KUBEWATCH_RESOURCES: {other}"
            ))),
        }
    }
}

impl fmt::Display for WatchedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Main configuration for the gateway
#[derive(Debug, Clone)]
pub struct Config {
    /// Admission filter settings
    pub filter: FilterConfig,

    /// Namespace to watch (None = all namespaces)
    pub namespace: Option<String>,

    /// Label selector applied to every watch
    pub label_selector: Option<String>,

    /// Resources to watch
    pub resources: Vec<WatchedResource>,

    /// Sink endpoint; stdout when unset
    pub webhook_url: Option<String>,

    /// Capacity of the ingest channel
    pub channel_capacity: usize,

    /// Metrics server address
    pub metrics_addr: SocketAddr,

    /// Log level, used when `RUST_LOG` is not set
    pub log_level: String,

    /// Log format (json or pretty)
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            namespace: None,
            label_selector: None,
            resources: vec![
                WatchedResource::Pods,
                WatchedResource::Jobs,
                WatchedResource::Events,
            ],
            webhook_url: None,
            channel_capacity: 1024,
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Config::default();

        config.filter.advanced_filters = get("ADVANCED_FILTERS");
        config.namespace = get("KUBEWATCH_NAMESPACE");
        config.label_selector = get("KUBEWATCH_LABEL_SELECTOR");
        config.webhook_url = get("KUBEWATCH_WEBHOOK_URL");

        if let Some(resources) = get("KUBEWATCH_RESOURCES") {
            config.resources = parse_resources(&resources)?;
        }

        if let Some(cap) = get("KUBEWATCH_CHANNEL_CAPACITY") {
            config.channel_capacity = cap.parse().map_err(|e| {
                GatewayError::Config(format!("invalid KUBEWATCH_CHANNEL_CAPACITY: {e}"))
            })?;
            if config.channel_capacity == 0 {
                return Err(GatewayError::Config(
                    "KUBEWATCH_CHANNEL_CAPACITY must be greater than 0".to_string(),
                ));
            }
        }

        if let Some(addr) = get("KUBEWATCH_METRICS_ADDR") {
            config.metrics_addr = addr
                .parse()
                .map_err(|e| GatewayError::Config(format!("invalid KUBEWATCH_METRICS_ADDR: {e}")))?;
        }

        if let Some(level) = get("KUBEWATCH_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(format) = get("KUBEWATCH_LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(GatewayError::Config(format!(
                        "invalid KUBEWATCH_LOG_FORMAT: {other} (expected 'json' or 'pretty')"
                    )));
                }
            };
        }

        Ok(config)
    }
}

/// Parse a comma-separated resource list, keeping first-seen order
///
/// Each resource gets exactly one watch, so repeats are collapsed. The two
/// Event API groups serve the same objects and cannot be combined.
fn parse_resources(raw: &str) -> Result<Vec<WatchedResource>> {
    let mut seen = HashSet::new();
    let mut resources = Vec::new();

    for name in raw.split(',').filter(|r| !r.trim().is_empty()) {
        let resource = name.parse::<WatchedResource>()?;
        if seen.insert(resource) {
            resources.push(resource);
        }
    }

    if resources.is_empty() {
        return Err(GatewayError::Config(
            "KUBEWATCH_RESOURCES names no resources".to_string(),
        ));
    }

    if seen.contains(&WatchedResource::Events) && seen.contains(&WatchedResource::EventsV1) {
        return Err(GatewayError::Config(
            "KUBEWATCH_RESOURCES: 'events' and 'events.k8s.io' watch the same objects, pick one"
                .to_string(),
        ));
    }

    Ok(resources)
}
