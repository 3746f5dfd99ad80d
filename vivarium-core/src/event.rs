//! Interrupt-to-task event flag
//!
//! Single-producer/single-consumer handoff between the touch INT edge
//! handler and the polling task. The interrupt side performs exactly one
//! atomic store; all real work happens at poll time.

use core::sync::atomic::{AtomicBool, Ordering};

/// One-shot pending-event flag
///
/// The producer (interrupt context) calls [`raise`](EventFlag::raise);
/// the consumer (polling task) calls [`take`](EventFlag::take), which
/// clears the flag as it reads it.
#[derive(Debug)]
pub struct EventFlag(AtomicBool);

impl EventFlag {
    /// Create a lowered flag
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raise the flag. Safe to call from interrupt context.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume the flag, returning whether it was raised
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}
