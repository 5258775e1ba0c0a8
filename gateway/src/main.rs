//! Kubewatch Gateway - watch Kubernetes and forward interesting changes
//!
//! ## Usage
//!
//! ```bash
//! # Everything to stdout
//! cargo run
//!
//! # Only failures, restarts and warnings, to a webhook
//! ADVANCED_FILTERS=true KUBEWATCH_WEBHOOK_URL=http://sink:5000/events cargo run
//! ```
//!
//! ## Environment Variables
//!
//! - `ADVANCED_FILTERS`: enable the admission filter (default: false)
//! - `KUBEWATCH_NAMESPACE`: namespace to watch (default: all)
//! - `KUBEWATCH_LABEL_SELECTOR`: label selector for every watch
//! - `KUBEWATCH_RESOURCES`: comma-separated resources (default: "pods,jobs,events")
//! - `KUBEWATCH_WEBHOOK_URL`: sink endpoint (default: stdout)
//! - `KUBEWATCH_CHANNEL_CAPACITY`: ingest channel capacity (default: 1024)
//! - `KUBEWATCH_METRICS_ADDR`: metrics server address (default: "0.0.0.0:9090")
//! - `KUBEWATCH_LOG_LEVEL`: log level (default: "info")
//! - `KUBEWATCH_LOG_FORMAT`: "pretty" or "json" (default: "pretty")

use anyhow::Context;
use kube::Client;
use kubewatch_gateway::config::Config;
use kubewatch_gateway::emit::{StdoutEmitter, WebhookEmitter};
use kubewatch_gateway::filter::EventFilter;
use kubewatch_gateway::hub::Hub;
use kubewatch_gateway::ingest::{K8sIngestor, K8sIngestorConfig};
use kubewatch_gateway::logging;
use kubewatch_gateway::metrics::Metrics;
use kubewatch_gateway::metrics_server::MetricsServer;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config)?;

    info!(
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        resources = ?config.resources,
        metrics_addr = %config.metrics_addr,
        channel_capacity = config.channel_capacity,
        "Starting kubewatch gateway"
    );

    Metrics::init()?;
    let metrics_handle = MetricsServer::start(config.metrics_addr);

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    let hub = Hub::new()
        .channel_capacity(config.channel_capacity)
        .middleware(EventFilter::new(&config.filter));

    let hub = match &config.webhook_url {
        Some(url) => {
            info!(%url, "Forwarding to webhook");
            hub.emitter(WebhookEmitter::new(url)?)
        }
        None => {
            info!("Forwarding to stdout");
            hub.emitter(StdoutEmitter::pretty())
        }
    };

    let (sender, runner) = hub.build();

    let ingestor = K8sIngestor::with_config(client, K8sIngestorConfig::from(&config));
    let mut watchers = ingestor.spawn_watchers(&config.resources, sender);

    let mut hub_handle = tokio::spawn(runner.run());

    let outcome = tokio::select! {
        _ = shutdown_signal() => Ok(()),
        Some(err) = watchers.next_failure() => {
            // A resource without a watch is a broken gateway; exit and let the
            // orchestrator restart it
            Err(anyhow::Error::new(err).context("watch stopped"))
        }
        result = &mut hub_handle => {
            watchers.shutdown().await;
            metrics_handle.abort();
            return match result {
                Ok(Ok(_)) => Err(anyhow::anyhow!("hub stopped unexpectedly")),
                Ok(Err(e)) => Err(anyhow::Error::new(e).context("hub stopped")),
                Err(e) => Err(anyhow::Error::new(e).context("hub task failed")),
            };
        }
    };

    // Watchers own the only senders; stopping them lets the hub drain
    watchers.shutdown().await;
    match hub_handle.await {
        Ok(Ok(stats)) => info!(
            observed = stats.observed,
            forwarded = stats.forwarded,
            dropped = stats.dropped,
            "Pipeline drained"
        ),
        Ok(Err(e)) => error!(error = %e, "Pipeline shutdown failed"),
        Err(e) => error!(error = %e, "Hub task failed"),
    }

    metrics_handle.abort();
    match &outcome {
        Ok(()) => info!("Kubewatch gateway shutdown complete"),
        Err(e) => error!(error = ?e, "Kubewatch gateway stopped on error"),
    }
    outcome
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
