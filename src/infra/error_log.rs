//! Bounded log of recent unexpected errors, readable by admins.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use utoipa::ToSchema;

use crate::config::ERROR_LOG_CAPACITY;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    pub code: String,
    pub detail: String,
    /// Recorded from a panic
    pub fatal: bool,
}

/// Ring buffer shared by the API middleware, the state containers and the
/// panic hook. The oldest entry is dropped once capacity is reached.
#[derive(Clone)]
pub struct ErrorLog {
    entries: Arc<Mutex<VecDeque<ErrorEntry>>>,
    capacity: usize,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(ERROR_LOG_CAPACITY)
    }
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    // Recording must keep working after a panic elsewhere poisoned the lock
    fn lock(&self) -> MutexGuard<'_, VecDeque<ErrorEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, entry: ErrorEntry) {
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn record(&self, code: impl Into<String>, detail: impl Into<String>) {
        self.push(ErrorEntry {
            at: Utc::now(),
            code: code.into(),
            detail: detail.into(),
            fatal: false,
        });
    }

    pub fn record_fatal(&self, detail: impl Into<String>) {
        self.push(ErrorEntry {
            at: Utc::now(),
            code: "PANIC".to_string(),
            detail: detail.into(),
            fatal: true,
        });
    }

    /// Newest first
    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.lock().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Record panics in `log`, then hand over to the previously installed hook.
pub fn install_panic_hook(log: ErrorLog) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        let detail = match info.location() {
            Some(location) => format!("{} at {}:{}", message, location.file(), location.line()),
            None => message,
        };

        tracing::error!(detail = %detail, "Panic");
        log.record_fatal(detail);
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_bounded_and_newest_first() {
        let log = ErrorLog::new(3);
        for i in 0..5 {
            log.record("INTERNAL_ERROR", format!("failure {}", i));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].detail, "failure 4");
        assert_eq!(entries[2].detail, "failure 2");
    }

    #[test]
    fn test_default_capacity() {
        let log = ErrorLog::default();
        for i in 0..(ERROR_LOG_CAPACITY + 10) {
            log.record("X", i.to_string());
        }
        assert_eq!(log.len(), ERROR_LOG_CAPACITY);
    }

    #[test]
    fn test_panic_hook_records_fatal_entry() {
        let log = ErrorLog::new(10);
        install_panic_hook(log.clone());

        let result = std::panic::catch_unwind(|| panic!("kitchen fire"));
        let _ = std::panic::take_hook();

        assert!(result.is_err());
        let entries = log.entries();
        assert!(entries.iter().any(|e| e.fatal && e.detail.contains("kitchen fire")));
    }
}
