//! Classification audit log
//!
//! A capped, append-only ring buffer of classification decisions. The
//! append-and-trim step runs under one lock so interleaved classification
//! calls can neither lose events nor grow the buffer past its cap.

use std::collections::VecDeque;

use domain::ClassificationAuditEvent;
use parking_lot::Mutex;
use tracing::debug;

/// Events retained before FIFO eviction kicks in
pub const AUDIT_LOG_CAPACITY: usize = 100;

/// Per-session audit trail of classification decisions
#[derive(Debug)]
pub struct ClassificationAuditLog {
    events: Mutex<VecDeque<ClassificationAuditEvent>>,
    capacity: usize,
}

impl Default for ClassificationAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationAuditLog {
    /// Create a log with the standard capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(AUDIT_LOG_CAPACITY)
    }

    /// Create a log with a custom capacity (tests use small ones)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event, evicting the oldest entries past the cap
    pub fn record(&self, event: ClassificationAuditEvent) {
        let mut events = self.events.lock();
        events.push_back(event);
        while events.len() > self.capacity {
            events.pop_front();
        }
        debug!(entries = events.len(), "Audit event recorded");
    }

    /// Copy of the retained events, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<ClassificationAuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Drop all retained events
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Number of retained events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use domain::ClassificationOutcome;

    use super::*;

    fn event(id: &str) -> ClassificationAuditEvent {
        ClassificationAuditEvent::from_outcome(id, &ClassificationOutcome::allowed())
    }

    #[test]
    fn events_are_retained_in_order() {
        let log = ClassificationAuditLog::new();
        log.record(event("m-1"));
        log.record(event("m-2"));

        let events = log.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].content_id, "m-1");
        assert_eq!(events[1].content_id, "m-2");
    }

    #[test]
    fn capacity_is_enforced_with_fifo_eviction() {
        let log = ClassificationAuditLog::new();
        for i in 0..AUDIT_LOG_CAPACITY + 1 {
            log.record(event(&format!("m-{i}")));
        }

        assert_eq!(log.len(), AUDIT_LOG_CAPACITY);
        let events = log.snapshot();
        // The oldest entry (m-0) was evicted by the 101st append.
        assert_eq!(events[0].content_id, "m-1");
        assert_eq!(
            events[AUDIT_LOG_CAPACITY - 1].content_id,
            format!("m-{AUDIT_LOG_CAPACITY}")
        );
    }

    #[test]
    fn small_capacity_evicts_early() {
        let log = ClassificationAuditLog::with_capacity(2);
        log.record(event("m-1"));
        log.record(event("m-2"));
        log.record(event("m-3"));

        let events = log.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].content_id, "m-2");
    }

    #[test]
    fn clear_empties_the_log() {
        let log = ClassificationAuditLog::new();
        log.record(event("m-1"));
        assert!(!log.is_empty());

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        use std::sync::Arc;

        let log = Arc::new(ClassificationAuditLog::with_capacity(1000));
        let mut handles = Vec::new();
        for t in 0..8 {
            let log = Arc::clone(&log);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    log.record(event(&format!("t{t}-m{i}")));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 8 * 50);
    }
}
