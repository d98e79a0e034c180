//! Render sink boundary.
//!
//! The engine pushes `(name, rendered text)` pairs outward through this
//! trait and assumes nothing about the UI behind it. [`LogSink`] ships with
//! the binary; [`MemorySink`] captures events for tests and harnesses.

use std::sync::Mutex;

use log::{debug, info, warn};

/// Consumer of tile updates.
pub trait RenderSink: Send + Sync {
    /// A metric entered its loading state (shown only before first data).
    fn set_loading(&self, name: &str);
    /// A metric that has never resolved failed again; `message` backs the
    /// retry affordance.
    fn set_error(&self, name: &str, message: &str);
    /// A fresh rendered value for a tile. `meta_label` is the snapshot's
    /// provenance/freshness note.
    fn set_value(&self, name: &str, rendered: &str, meta_label: &str);
}

/// Sink that writes tile updates to the log.
pub struct LogSink;

impl RenderSink for LogSink {
    fn set_loading(&self, name: &str) {
        debug!("[{name}] loading...");
    }

    fn set_error(&self, name: &str, message: &str) {
        warn!("[{name}] error: {message}");
    }

    fn set_value(&self, name: &str, rendered: &str, meta_label: &str) {
        info!("[{name}] {rendered} ({meta_label})");
    }
}

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Loading(String),
    Error { name: String, message: String },
    Value { name: String, rendered: String, meta_label: String },
}

/// Capturing sink for tests and embedding harnesses.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    pub fn values_for(&self, name: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Value { name: n, rendered, .. } if n == name => Some(rendered),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().expect("sink lock poisoned").push(event);
    }
}

impl RenderSink for MemorySink {
    fn set_loading(&self, name: &str) {
        self.push(SinkEvent::Loading(name.to_string()));
    }

    fn set_error(&self, name: &str, message: &str) {
        self.push(SinkEvent::Error {
            name: name.to_string(),
            message: message.to_string(),
        });
    }

    fn set_value(&self, name: &str, rendered: &str, meta_label: &str) {
        self.push(SinkEvent::Value {
            name: name.to_string(),
            rendered: rendered.to_string(),
            meta_label: meta_label.to_string(),
        });
    }
}
