//! Cooperative cancellation for long-running fits.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{HardnessError, Result};

/// Shared flag polled by leave-one-out loops and grid search.
///
/// Clones observe the same flag, so a caller can keep one handle and hand
/// another to the registry.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `HardnessError::Cancelled` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(HardnessError::Cancelled);
        }
        Ok(())
    }
}

/// Poll an optional token.
pub fn check_cancelled(cancel: Option<&CancelToken>) -> Result<()> {
    match cancel {
        Some(token) => token.check(),
        None => Ok(()),
    }
}
