//! Lock-free single-writer/single-reader snapshot buffer (seqlock).
//!
//! This is the only state shared between the two cores.
//!
//! # Architecture
//!
//! ```text
//! Core 0                 SharedStateBuffer              Core 1
//! ──────                 ─────────────────              ──────
//! InputPoller ──write──▶ [sequence][snapshot] ──read──▶ ProtocolResponder
//!                        even = stable
//!                        odd  = write in progress
//! ```
//!
//! # Rules
//!
//! - Exactly one writer and one reader
//! - The writer never waits; `write` is O(1) and has no failure mode
//! - The reader never returns a snapshot mixing two writes
//! - Only atomic operations for synchronization, nothing blocks

use core::cell::UnsafeCell;
use core::ptr;

use crate::snapshot::InputSnapshot;
use crate::sync::{fence, AtomicU32, Ordering};

/// Seqlock around one `InputSnapshot`.
///
/// # Safety
///
/// The snapshot lives in an `UnsafeCell` and is copied without per-field
/// atomicity. This is sound within the rules because:
/// - Single writer (enforced by design, not by type system)
/// - The reader only trusts a copy taken between two equal, even sequence loads
/// - Copies use volatile accesses so a torn copy is discarded, never reasoned about
///
/// # Memory Ordering
///
/// - Writer: `AcqRel` increment to odd, release fence, copy, `Release` increment to even
/// - Reader: `Acquire` load, copy, acquire fence, `Acquire` load
#[repr(C)]
pub struct SharedStateBuffer {
    /// Even = stable, odd = write in progress.
    sequence: AtomicU32,

    /// Latest published snapshot.
    snapshot: UnsafeCell<InputSnapshot>,

    /// Completed reads (reader-owned diagnostic).
    reads: AtomicU32,

    /// Sum of retries across all reads (reader-owned diagnostic).
    total_retries: AtomicU32,

    /// Largest retry count any single read needed (reader-owned diagnostic).
    max_retries: AtomicU32,
}

// SAFETY: Single writer, single reader, sequence-counter coordination.
// Torn copies are detected and thrown away by the reader.
unsafe impl Sync for SharedStateBuffer {}
unsafe impl Send for SharedStateBuffer {}

impl SharedStateBuffer {
    /// Create a buffer holding the released/centered snapshot.
    pub const fn new() -> Self {
        Self::with_snapshot(InputSnapshot::RELEASED)
    }

    /// Create a buffer holding `initial`.
    pub const fn with_snapshot(initial: InputSnapshot) -> Self {
        Self {
            sequence: AtomicU32::new(0),
            snapshot: UnsafeCell::new(initial),
            reads: AtomicU32::new(0),
            total_retries: AtomicU32::new(0),
            max_retries: AtomicU32::new(0),
        }
    }

    /// Publish a new snapshot (writer side only).
    ///
    /// # Timing
    ///
    /// O(1): two atomic increments and an 8-byte copy. Never blocks.
    #[inline]
    pub fn write(&self, snapshot: &InputSnapshot) {
        // Odd: readers back off from here on
        self.sequence.fetch_add(1, Ordering::AcqRel);
        // Snapshot stores must not become visible before the odd sequence
        fence(Ordering::Release);

        // SAFETY: Single writer. A reader racing this copy sees an odd or
        // changed sequence and discards what it read.
        unsafe {
            ptr::write_volatile(self.snapshot.get(), *snapshot);
        }

        // Even again: publishes the copy above
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// Read the latest complete snapshot (reader side only).
    ///
    /// Spins while a write is in progress or a write raced the copy. The
    /// writer's critical section is a handful of instructions, so in practice
    /// this returns within a retry or two.
    #[inline]
    pub fn read(&self) -> InputSnapshot {
        let mut retries = 0u32;
        loop {
            if let Some(snapshot) = self.read_attempt() {
                self.record_read(retries);
                return snapshot;
            }
            retries = retries.saturating_add(1);
            core::hint::spin_loop();
        }
    }

    /// Read with a hard bound on attempts (reader side only).
    ///
    /// Returns `Err(ReadContended)` if every one of `max_attempts` attempts
    /// raced a write. `max_attempts == 0` always fails.
    #[inline]
    pub fn try_read(&self, max_attempts: u32) -> Result<InputSnapshot, ReadContended> {
        for attempt in 0..max_attempts {
            if let Some(snapshot) = self.read_attempt() {
                self.record_read(attempt);
                return Ok(snapshot);
            }
            core::hint::spin_loop();
        }
        Err(ReadContended { attempts: max_attempts })
    }

    /// One pass of the read protocol. `None` = unstable, try again.
    #[inline]
    fn read_attempt(&self) -> Option<InputSnapshot> {
        let v1 = self.sequence.load(Ordering::Acquire);
        if v1 & 1 != 0 {
            // Write in progress
            return None;
        }

        // SAFETY: The copy may race the writer; it is only returned if the
        // sequence is unchanged afterwards. Volatile keeps the copy between
        // the two loads.
        let snapshot = unsafe { ptr::read_volatile(self.snapshot.get()) };

        // Copy must complete before the second sequence load
        fence(Ordering::Acquire);
        let v2 = self.sequence.load(Ordering::Acquire);

        if v1 == v2 {
            Some(snapshot)
        } else {
            None
        }
    }

    fn record_read(&self, retries: u32) {
        // Reader-owned counters: plain load/store is enough
        self.reads
            .store(self.reads.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
        if retries > 0 {
            let total = self.total_retries.load(Ordering::Relaxed);
            self.total_retries
                .store(total.saturating_add(retries), Ordering::Relaxed);
            if retries > self.max_retries.load(Ordering::Relaxed) {
                self.max_retries.store(retries, Ordering::Relaxed);
            }
        }
    }

    /// Current sequence value.
    ///
    /// Even when no write is in progress.
    #[inline]
    pub fn sequence(&self) -> u32 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Check if a write is in progress right now.
    #[inline]
    pub fn is_write_in_progress(&self) -> bool {
        self.sequence() & 1 != 0
    }

    /// Number of completed writes (wraps with the sequence counter).
    #[inline]
    pub fn writes(&self) -> u32 {
        self.sequence() / 2
    }

    /// Largest number of retries a single read has needed.
    #[inline]
    pub fn max_retries(&self) -> u32 {
        self.max_retries.load(Ordering::Relaxed)
    }

    /// Get a snapshot of the reader diagnostics.
    #[inline]
    pub fn diagnostics(&self) -> ReadDiagnostics {
        ReadDiagnostics {
            reads: self.reads.load(Ordering::Relaxed),
            total_retries: self.total_retries.load(Ordering::Relaxed),
            max_retries: self.max_retries.load(Ordering::Relaxed),
        }
    }

    /// Reset reader diagnostics (e.g., after reporting).
    ///
    /// Call from the reader side only.
    #[inline]
    pub fn reset_diagnostics(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.total_retries.store(0, Ordering::Relaxed);
        self.max_retries.store(0, Ordering::Relaxed);
    }
}

impl Default for SharedStateBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Every bounded read attempt raced a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadContended {
    pub attempts: u32,
}

impl core::fmt::Display for ReadContended {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "snapshot unstable after {} attempts", self.attempts)
    }
}

/// Reader statistics at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadDiagnostics {
    pub reads: u32,
    pub total_retries: u32,
    pub max_retries: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Button, PressedButtons};

    #[test]
    fn test_initial_state() {
        let buf = SharedStateBuffer::new();
        assert_eq!(buf.sequence(), 0);
        assert!(!buf.is_write_in_progress());
        assert_eq!(buf.read(), InputSnapshot::RELEASED);
    }

    #[test]
    fn test_write_then_read() {
        let buf = SharedStateBuffer::new();
        let s = InputSnapshot::encode(PressedButtons::NONE.with(Button::Cross));

        buf.write(&s);

        assert_eq!(buf.read(), s);
        assert_eq!(buf.sequence(), 2);
        assert_eq!(buf.writes(), 1);
    }

    #[test]
    fn test_latest_write_wins() {
        let buf = SharedStateBuffer::new();
        let first = InputSnapshot::encode(PressedButtons::NONE.with(Button::Up));
        let second = InputSnapshot::encode(PressedButtons::NONE.with(Button::Down));

        buf.write(&first);
        buf.write(&second);

        assert_eq!(buf.read(), second);
        assert_eq!(buf.writes(), 2);
    }

    #[test]
    fn test_sequence_even_after_operations() {
        let buf = SharedStateBuffer::new();
        for _ in 0..5 {
            buf.write(&InputSnapshot::RELEASED);
            assert_eq!(buf.sequence() % 2, 0);
            let _ = buf.read();
            assert_eq!(buf.sequence() % 2, 0);
        }
    }

    #[test]
    fn test_try_read_uncontended() {
        let buf = SharedStateBuffer::new();
        assert_eq!(buf.try_read(1), Ok(InputSnapshot::RELEASED));
        assert_eq!(buf.try_read(0), Err(ReadContended { attempts: 0 }));
    }

    #[test]
    fn test_try_read_during_write_fails() {
        let buf = SharedStateBuffer::new();
        // Simulate a writer stalled mid-write
        buf.sequence.fetch_add(1, Ordering::AcqRel);

        assert!(buf.is_write_in_progress());
        assert_eq!(buf.try_read(4), Err(ReadContended { attempts: 4 }));

        buf.sequence.fetch_add(1, Ordering::Release);
        assert!(buf.try_read(1).is_ok());
    }

    #[test]
    fn test_diagnostics_count_reads() {
        let buf = SharedStateBuffer::new();
        for _ in 0..3 {
            let _ = buf.read();
        }

        let d = buf.diagnostics();
        assert_eq!(d.reads, 3);
        assert_eq!(d.total_retries, 0);
        assert_eq!(d.max_retries, 0);

        buf.reset_diagnostics();
        assert_eq!(buf.diagnostics(), ReadDiagnostics::default());
    }
}
