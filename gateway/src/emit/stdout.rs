//! Stdout emitter for debugging
//!
//! Prints admitted events to stdout, either one line per event or as a
//! boxed block.

use crate::emit::Emitter;
use crate::error::PluginError;
use crate::event::Event;
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stdout emitter - prints events for debugging
pub struct StdoutEmitter {
    pretty: bool,
    emitted_count: AtomicU64,
}

impl StdoutEmitter {
    /// One line per event
    pub fn new() -> Self {
        Self {
            pretty: false,
            emitted_count: AtomicU64::new(0),
        }
    }

    /// A block per event
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            emitted_count: AtomicU64::new(0),
        }
    }

    /// Get total events emitted
    pub fn emitted_count(&self) -> u64 {
        self.emitted_count.load(Ordering::Relaxed)
    }

    fn write_event(&self, out: &mut impl Write, event: &Event) -> std::io::Result<()> {
        if !self.pretty {
            return writeln!(
                out,
                "[{}] {} {}",
                event.kind,
                event.reason,
                qualified_name(event)
            );
        }

        writeln!(out, "┌─ {} ─────────────────────────────────────────────", event.kind)?;
        writeln!(out, "│ Reason:    {}", event.reason)?;
        writeln!(out, "│ Namespace: {}", event.namespace())?;
        writeln!(out, "│ Name:      {}", event.name())?;
        if event.previous.is_some() {
            writeln!(out, "│ Previous:  yes")?;
        }
        writeln!(out, "└─────────────────────────────────────────────────────")
    }
}

fn qualified_name(event: &Event) -> String {
    match (event.namespace(), event.name()) {
        ("", name) => name.to_string(),
        (namespace, name) => format!("{namespace}/{name}"),
    }
}

impl Default for StdoutEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Emitter for StdoutEmitter {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn emit(&self, events: &[Event]) -> Result<(), PluginError> {
        let mut stdout = std::io::stdout().lock();

        for event in events {
            self.write_event(&mut stdout, event)
                .map_err(|e| PluginError::Send(format!("stdout: {e}")))?;
        }

        self.emitted_count
            .fetch_add(events.len() as u64, Ordering::Relaxed);

        Ok(())
    }

    async fn health(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Pod;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    fn pod_event(namespace: &str, name: &str) -> Event {
        Event::created(Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_emit_events() {
        let emitter = StdoutEmitter::new();
        let events = vec![pod_event("default", "a"), pod_event("default", "b")];

        emitter.emit(&events).await.unwrap();

        assert_eq!(emitter.emitted_count(), 2);
    }

    #[test]
    fn test_compact_line() {
        let emitter = StdoutEmitter::new();
        let mut out = Vec::new();

        emitter
            .write_event(&mut out, &pod_event("prod", "web-0"))
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "[Pod] Created prod/web-0\n");
    }

    #[test]
    fn test_compact_line_cluster_scoped() {
        let emitter = StdoutEmitter::new();
        let mut out = Vec::new();
        let event = Event::new("Node", "Deleted", json!({"metadata": {"name": "worker-3"}}));

        emitter.write_event(&mut out, &event).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "[Node] Deleted worker-3\n");
    }

    #[test]
    fn test_pretty_block() {
        let emitter = StdoutEmitter::pretty();
        let mut out = Vec::new();
        let event = Event::updated(Pod::default(), Pod::default());

        emitter.write_event(&mut out, &event).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("│ Reason:    Updated"));
        assert!(text.contains("│ Previous:  yes"));
    }

    #[tokio::test]
    async fn test_health() {
        let emitter = StdoutEmitter::new();
        assert!(emitter.health().await);
    }
}
