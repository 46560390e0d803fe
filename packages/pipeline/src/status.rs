//! Status signals for the presentation layer.
//!
//! Defines a [`StatusReporter`] trait that decouples the pipeline from
//! whatever shows its progress (a terminal spinner, a UI toast, or
//! nothing at all). The wording of messages is not part of the pipeline's
//! contract; only the levels and the points at which they fire are.

use std::sync::Arc;

use strum_macros::{AsRefStr, Display};

/// Severity of a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives processing-state changes and human-readable status events.
///
/// Implementations must be `Send + Sync` so a reporter can be shared
/// across tasks behind an `Arc`.
pub trait StatusReporter: Send + Sync {
    /// Called with `true` when a submission starts and `false` when it
    /// reaches a result (or is abandoned).
    fn set_processing(&self, processing: bool);

    /// A status event worth showing to the user.
    fn notify(&self, level: StatusLevel, message: &str);
}

/// A [`StatusReporter`] that ignores everything.
pub struct NullStatus;

impl StatusReporter for NullStatus {
    fn set_processing(&self, _processing: bool) {}
    fn notify(&self, _level: StatusLevel, _message: &str) {}
}

/// Returns a shared [`NullStatus`] instance.
#[must_use]
pub fn null_status() -> Arc<dyn StatusReporter> {
    Arc::new(NullStatus)
}

/// Forwards status events to the `log` facade.
pub struct LogStatus;

impl StatusReporter for LogStatus {
    fn set_processing(&self, processing: bool) {
        log::trace!("processing={processing}");
    }

    fn notify(&self, level: StatusLevel, message: &str) {
        match level {
            StatusLevel::Info | StatusLevel::Success => log::info!("{message}"),
            StatusLevel::Warning => log::warn!("{message}"),
            StatusLevel::Error => log::error!("{message}"),
        }
    }
}
