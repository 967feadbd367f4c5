//! Process-wide log callback registration.
//!
//! The runtime emits diagnostics through `tracing` like the teacher crate
//! does throughout its socket/actor modules. On top of that, hosts that want
//! to redirect events into their own sink (matching the original global
//! `LogCallback`) can register one callback at session construction time.

use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Severity of a single log event, mirroring the data model's `Severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Trace,
}

impl Severity {
    #[must_use]
    pub const fn as_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warning => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

pub type LogCallback = Arc<dyn Fn(Severity, &str) + Send + Sync>;

static LOG_CALLBACK: OnceCell<LogCallback> = OnceCell::new();

/// Register the process-wide log callback. Only the first registration
/// takes effect; later calls are no-ops, matching a single global sink.
pub fn set_log_callback(callback: LogCallback) {
    let _ = LOG_CALLBACK.set(callback);
}

/// Emit a log event: always through `tracing`, and through the registered
/// callback if one was set.
pub fn log(severity: Severity, message: &str) {
    match severity {
        Severity::Error => tracing::error!("{message}"),
        Severity::Warning => tracing::warn!("{message}"),
        Severity::Info => tracing::info!("{message}"),
        Severity::Trace => tracing::trace!("{message}"),
    }
    if let Some(cb) = LOG_CALLBACK.get() {
        cb(severity, message);
    }
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Severity::Warning, &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::Severity::Error, &format!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn callback_receives_events() {
        static COUNT: AtomicUsize = AtomicUsize::new(0);
        set_log_callback(Arc::new(|_sev, _msg| {
            COUNT.fetch_add(1, Ordering::SeqCst);
        }));
        log(Severity::Info, "hello");
        assert!(COUNT.load(Ordering::SeqCst) >= 1);
    }
}
