//! Termination signals.
//!
//! SIGINT and SIGTERM raise a [`ShutdownSignal`] instead of killing the
//! process; the runner polls it once per loop iteration and shuts the demo
//! down the same way a window close does.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag raised by a termination signal.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    raised: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// A flag nothing but [`raise`](Self::raise) sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes SIGINT and SIGTERM to a new flag.
    ///
    /// Only one handler can be installed per process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let signal = Self::new();
        let handler = signal.clone();
        ctrlc::set_handler(move || {
            log::info!("termination signal received, shutting down");
            handler.raise();
        })?;
        Ok(signal)
    }

    /// Installs the handler, or falls back to a plain flag with a warning.
    #[must_use]
    pub fn install_or_warn() -> Self {
        Self::install().unwrap_or_else(|err| {
            log::warn!("termination signals not handled: {err}");
            Self::new()
        })
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
