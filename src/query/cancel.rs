//! Cancellation for running evaluations.
//!
//! Every producer thread spawned by an evaluation holds a clone of the
//! token and checks it before emitting each result. Once cancelled, the
//! producers stop and their streams end early.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag for terminating an evaluation early.
///
/// The default token is never cancelled unless [`cancel`](Self::cancel)
/// is called on it or one of its clones.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every evaluation holding this token (or a clone of it).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Some(())` while still active, `None` once cancelled,
    /// so producers can bail out with `?`.
    #[inline]
    pub(crate) fn check(&self) -> Option<()> {
        if self.is_cancelled() { None } else { Some(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_token_is_not_cancelled() {
        let token = CancellationToken::default();
        assert!(!token.is_cancelled());
        assert!(token.check().is_some());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(token.check().is_none());
    }
}
