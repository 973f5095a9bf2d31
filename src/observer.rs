//! Observability seam for request resolution.
//!
//! When the graph defines a `dyn ResolutionLogger`, every
//! [`RequestHandler`](crate::RequestHandler) reports how long resolving its
//! parameters took, after resolution and before the handler runs.

use std::time::Duration;

/// Receives per-request resolution timings.
///
/// Define it like any other capability, usually as a Singleton:
///
/// ```
/// use ferrous_wire::{Lifetime, Registry, ResolutionLogger, TracingLogger};
/// use std::sync::Arc;
///
/// let mut registry = Registry::new();
/// registry
///     .add(|| Arc::new(TracingLogger::new()) as Arc<dyn ResolutionLogger>, Lifetime::Singleton)
///     .unwrap();
/// ```
pub trait ResolutionLogger: Send + Sync {
    /// Time spent resolving one request's dependencies.
    fn request_duration(&self, elapsed: Duration);
}

/// A [`ResolutionLogger`] that emits timings as `tracing` events.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    label: String,
}

impl TracingLogger {
    /// Creates a logger labelled `ferrous-wire`.
    pub fn new() -> Self {
        Self {
            label: "ferrous-wire".to_string(),
        }
    }

    /// Creates a logger with a custom label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionLogger for TracingLogger {
    fn request_duration(&self, elapsed: Duration) {
        tracing::info!(
            label = %self.label,
            elapsed_us = elapsed.as_micros() as u64,
            "request dependencies resolved"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_label_is_kept() {
        let logger = TracingLogger::with_label("api");
        assert_eq!(logger.label(), "api");
        // Without a subscriber this is a no-op; it must not panic.
        logger.request_duration(Duration::from_millis(3));
    }
}
