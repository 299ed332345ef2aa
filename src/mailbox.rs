//! Status mailbox
//!
//! Single-byte atomic slot the responder core posts status requests into.
//! The producer core takes them and applies them to the annunciator, which
//! therefore never needs synchronization of its own.

use crate::annunciator::Status;
use crate::sync::{AtomicU8, Ordering};

/// Slot value meaning "nothing posted".
const EMPTY: u8 = 0xFF;

/// Latest-wins status request slot
pub struct StatusMailbox {
    slot: AtomicU8,
}

impl StatusMailbox {
    /// Create an empty mailbox
    pub const fn new() -> Self {
        Self {
            slot: AtomicU8::new(EMPTY),
        }
    }

    /// Post a status request, replacing any request not yet taken
    #[inline]
    pub fn post(&self, status: Status) {
        self.slot.store(status as u8, Ordering::Release);
    }

    /// Take the pending request, leaving the mailbox empty
    #[inline]
    pub fn take(&self) -> Option<Status> {
        match self.slot.swap(EMPTY, Ordering::AcqRel) {
            EMPTY => None,
            raw => Status::from_u8(raw),
        }
    }

    /// Look at the pending request without taking it
    #[inline]
    pub fn peek(&self) -> Option<Status> {
        match self.slot.load(Ordering::Acquire) {
            EMPTY => None,
            raw => Status::from_u8(raw),
        }
    }
}

impl Default for StatusMailbox {
    fn default() -> Self {
        Self::new()
    }
}
