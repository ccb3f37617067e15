//! Events the controller queues for its host.
//!
//! Nothing is rendered here. The host drains the queue after each call and
//! turns notices into toasts, progress into a bar, and so on.

use crate::loader::AcquisitionPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient, dismissible message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    Notice(Notice),
    /// At least one write landed; analytics and forecast caches are stale.
    AnalyticsInvalidated,
    /// Async snapshot job progress, 0..=100.
    LoadProgress { progress: u8, message: Option<String> },
    /// A load finished and its data is now displayed.
    Loaded { generation: u64, path: AcquisitionPath },
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GridEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.events.push(GridEvent::Notice(Notice { level, message: message.into() }));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(NoticeLevel::Error, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(NoticeLevel::Warning, message);
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Notices only, in queue order.
pub fn notices(events: &[GridEvent]) -> Vec<&Notice> {
    events
        .iter()
        .filter_map(|e| match e {
            GridEvent::Notice(n) => Some(n),
            _ => None,
        })
        .collect()
}
