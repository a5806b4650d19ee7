//! Cooperative cancellation for long ranking passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared between a request and the ranking work it spawned.
///
/// The ranker polls [`is_cancelled`](Self::is_cancelled) while iterating the
/// candidate pool and stops with `MatchError::Cancelled` once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns a guard that cancels this token when dropped.
    ///
    /// Held by an async request so that abandoning the request future stops
    /// ranking work running on the blocking pool.
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            token: Some(self.clone()),
        }
    }
}

#[derive(Debug)]
pub struct CancelOnDrop {
    token: Option<CancellationToken>,
}

impl CancelOnDrop {
    /// Disarm the guard once the work has completed.
    pub fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn guard_cancels_on_drop() {
        let token = CancellationToken::new();
        {
            let _guard = token.drop_guard();
        }
        assert!(token.is_cancelled());
    }

    #[test]
    fn disarmed_guard_leaves_token_alone() {
        let token = CancellationToken::new();
        token.drop_guard().disarm();
        assert!(!token.is_cancelled());
    }
}
