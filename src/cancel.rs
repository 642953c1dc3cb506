// Cooperative cancellation flags

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Create a cancel flag shared between a run and its walkers.
pub fn new_cancel_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// Request cancellation. Walkers and the browse producer check this flag
/// at their blocking points and wind down promptly.
pub fn request_cancel(flag: &AtomicBool) {
    flag.store(true, Ordering::Relaxed);
}

/// Check if a run has been cancelled.
pub fn is_cancelled(flag: &AtomicBool) -> bool {
    flag.load(Ordering::Relaxed)
}
