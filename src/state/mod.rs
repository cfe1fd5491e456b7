//! Domain state layer - Refreshable snapshots over the services.
//!
//! [`SessionState`] holds who is signed in; [`CatalogState`] holds what they
//! see. Every mutation writes through the services and then refetches, so a
//! snapshot is never ahead of the backend. Containers are plain values:
//! build one per client session.

mod catalog;
mod session;

pub use catalog::{CatalogSnapshot, CatalogState};
pub use session::SessionState;

use crate::errors::AppResult;
use crate::infra::ErrorLog;

/// Record unexpected failures before handing the result back
pub(crate) fn tracked<T>(log: &ErrorLog, result: AppResult<T>) -> AppResult<T> {
    if let Err(e) = &result {
        if e.is_unexpected() {
            tracing::error!(code = e.code(), detail = %e.detail(), "State action failed");
            log.record(e.code(), e.detail());
        }
    }
    result
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::config::Config;
    use crate::infra::{ErrorLog, LogMailer, MemoryBackend, MemorySessionStore};
    use crate::services::Services;

    /// Services over a freshly seeded memory backend
    pub fn demo_services() -> Arc<Services> {
        demo_services_with(Config::development())
    }

    pub fn demo_services_with(config: Config) -> Arc<Services> {
        let backend = Arc::new(MemoryBackend::with_demo_data().unwrap());
        Arc::new(Services::build(
            backend,
            Arc::new(MemorySessionStore::new()),
            Arc::new(LogMailer::new(config.smtp_from.clone())),
            config,
        ))
    }

    pub fn error_log() -> ErrorLog {
        ErrorLog::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use domain::DomainError;

    #[test]
    fn test_only_unexpected_failures_are_recorded() {
        let log = ErrorLog::default();

        let _ = tracked::<()>(&log, Err(AppError::from(DomainError::EventNotFound)));
        assert!(log.is_empty());

        let _ = tracked::<()>(&log, Err(AppError::internal("disk full")));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].code, "INTERNAL_ERROR");
    }
}
