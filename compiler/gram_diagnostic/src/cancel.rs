//! Cooperative cancellation.
//!
//! A [`CancelToken`] is checked at the top of `scan()`, at each iteration
//! of the parser's list loops, and at the top of bind/check entry points.
//! A signaled token aborts the current operation immediately; partially
//! built structures are never published to the caller.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The error raised when an operation observes a signaled [`CancelToken`].
///
/// Not retryable: the operation that observed it produced no output.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Canceled;

impl fmt::Display for Canceled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the operation was canceled")
    }
}

impl std::error::Error for Canceled {}

/// Shared cancellation flag.
///
/// Cloning produces another handle to the same flag. The default token is
/// never signaled unless [`CancelToken::cancel`] is called on a clone.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    signaled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Every clone of this token observes it.
    pub fn cancel(&self) {
        self.signaled.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.signaled.load(Ordering::Relaxed)
    }

    /// Return `Err(Canceled)` if the token has been signaled.
    #[inline]
    pub fn check(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }
}
