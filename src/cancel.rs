//! Cooperative cancellation (§5, Design Notes). The original relied on a
//! global signal-handler flag checked from deep inside its generation loop;
//! here the predictive loop instead takes an explicit, caller-owned token it
//! polls between symbols, so a library consumer embedding this crate isn't
//! forced to install a process-wide signal handler it never asked for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable flag the predictive loop polls between symbols.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`Self::cancel`] has been called on this token or a clone of it.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
