//! Cooperative progress reporting and cancellation
//!
//! Long batches are expected to run off any interactive thread. The
//! worker reports fractional completion after each item and checks a
//! shared cancel flag between items; a cancelled batch keeps what it
//! already produced. `Feedback` is the explicit handle for both sides:
//! clones share the cancel flag, so a controller thread can stop a
//! worker holding another clone.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type ProgressFn = dyn Fn(f64) + Send + Sync;

/// Progress and cancellation handle for a batch operation
#[derive(Clone, Default)]
pub struct Feedback {
    cancelled: Arc<AtomicBool>,
    progress: Option<Arc<ProgressFn>>,
}

impl Feedback {
    /// Handle with no progress listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle invoking `listener` with the completed fraction in [0, 1]
    /// after each processed item.
    pub fn with_progress(listener: impl Fn(f64) + Send + Sync + 'static) -> Self {
        Self::new().on_progress(listener)
    }

    /// Attach a progress listener, keeping the existing cancel flag.
    ///
    /// Clones taken before this call still share the flag, so a
    /// listener can cancel the very run it observes.
    pub fn on_progress(mut self, listener: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(listener));
        self
    }

    /// Request cancellation. Takes effect before the worker's next item.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Report the completed fraction to the listener, if any.
    pub fn report(&self, fraction: f64) {
        if let Some(listener) = &self.progress {
            listener(fraction.clamp(0.0, 1.0));
        }
    }
}

impl fmt::Debug for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feedback")
            .field("cancelled", &self.is_cancelled())
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}
