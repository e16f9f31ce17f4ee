//! Progress notification port
//!
//! The workflow emits coarse progress events an external channel may relay
//! to the user. Delivery is best-effort; the engine never depends on it
//! succeeding.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One coarse progress update for an upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percentage: u8,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ProgressEvent {
    pub fn new(percentage: u8, status: impl Into<String>) -> Self {
        Self {
            percentage: percentage.min(100),
            status: status.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Sink for progress events
pub trait ProgressNotifier: Send + Sync {
    fn notify(&self, upload_id: Uuid, event: &ProgressEvent);
}

/// Discards all events; the default when no channel is attached
pub struct NullNotifier;

impl ProgressNotifier for NullNotifier {
    fn notify(&self, _upload_id: Uuid, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_clamped() {
        let event = ProgressEvent::new(150, "parsing");
        assert_eq!(event.percentage, 100);
    }

    #[test]
    fn test_details_builder() {
        let event = ProgressEvent::new(50, "parsing").with_details("page 2 of 4");
        assert_eq!(event.details.as_deref(), Some("page 2 of 4"));
    }
}
