//! Consumer-side contract for the protocol responder core.
//!
//! The wire-level responder (bit timing, serial transaction handling) is a
//! separate component. It only ever sees this module:
//! - it is bound to a snapshot source and a restart entry point
//! - it reads the latest snapshot exactly once per host transaction
//!
//! # Example
//!
//! ```ignore
//! static BUFFER: SharedStateBuffer = SharedStateBuffer::new();
//! static MAILBOX: StatusMailbox = StatusMailbox::new();
//!
//! fn responder_main() { /* relaunch the core-1 task */ }
//!
//! let binding = ResponderBinding::new(&BUFFER, responder_main);
//! let mut responder = MonitorResponder::bind(binding, &MAILBOX);
//! loop {
//!     responder.serve_transaction();
//! }
//! ```

use crate::annunciator::Status;
use crate::mailbox::StatusMailbox;
use crate::seqlock::SharedStateBuffer;
use crate::snapshot::InputSnapshot;

/// Anything the responder can pull the latest snapshot from.
pub trait SnapshotSource {
    /// Latest complete snapshot. Must not block the producer.
    fn latest(&self) -> InputSnapshot;

    /// Latest snapshot, giving up after `max_attempts` unstable reads.
    ///
    /// Sources that never contend always answer.
    fn try_latest(&self, max_attempts: u32) -> Option<InputSnapshot> {
        let _ = max_attempts;
        Some(self.latest())
    }
}

impl SnapshotSource for SharedStateBuffer {
    #[inline]
    fn latest(&self) -> InputSnapshot {
        self.read()
    }

    #[inline]
    fn try_latest(&self, max_attempts: u32) -> Option<InputSnapshot> {
        self.try_read(max_attempts).ok()
    }
}

/// Entry point that restarts the responder from scratch.
pub type RestartFn = fn();

/// What a responder is initialized with.
pub struct ResponderBinding<'a, S: SnapshotSource + ?Sized> {
    source: &'a S,
    restart: RestartFn,
}

impl<'a, S: SnapshotSource + ?Sized> ResponderBinding<'a, S> {
    /// Bind a snapshot source and a restart entry point.
    pub fn new(source: &'a S, restart: RestartFn) -> Self {
        Self { source, restart }
    }

    /// Latest snapshot from the bound source.
    #[inline]
    pub fn latest(&self) -> InputSnapshot {
        self.source.latest()
    }

    /// Latest snapshot, or `None` if the source stayed unstable.
    #[inline]
    pub fn try_latest(&self, max_attempts: u32) -> Option<InputSnapshot> {
        self.source.try_latest(max_attempts)
    }

    /// Bound snapshot source.
    #[inline]
    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Invoke the restart entry point.
    pub fn restart(&self) {
        (self.restart)()
    }
}

/// A responder answering host transactions.
pub trait ProtocolResponder<'a, S: SnapshotSource + ?Sized + 'a>: Sized {
    /// Whatever else the responder needs besides the binding.
    type Context;

    /// Initialize the responder from its binding.
    fn bind(binding: ResponderBinding<'a, S>, context: Self::Context) -> Self;

    /// Answer one transaction, reading the snapshot source exactly once.
    ///
    /// Returns the snapshot that was answered with.
    fn serve_transaction(&mut self) -> InputSnapshot;
}

/// Stand-in responder that only observes the snapshot stream.
///
/// Reads one snapshot per transaction, counts transactions and input
/// changes, and announces `Ready` on its first transaction and `Polling`
/// from the second on.
///
/// A read that stays unstable for [`Self::READ_ATTEMPTS`] attempts is
/// answered with the previous snapshot (`RELEASED` before the first one).
/// After [`Self::RESTART_AFTER`] such transactions in a row the monitor
/// announces `Error` and invokes the restart entry point.
pub struct MonitorResponder<'a, S: SnapshotSource + ?Sized> {
    binding: ResponderBinding<'a, S>,
    status: &'a StatusMailbox,
    last: Option<InputSnapshot>,
    announced: Option<Status>,
    transactions: u32,
    changes: u32,
    /// Consecutive transactions whose read gave up
    stalled: u32,
    restarts: u32,
}

impl<'a, S: SnapshotSource + ?Sized> MonitorResponder<'a, S> {
    /// Read attempts per transaction before falling back.
    pub const READ_ATTEMPTS: u32 = 1024;

    /// Consecutive stalled transactions that trigger a restart.
    pub const RESTART_AFTER: u32 = 3;

    /// Transactions served so far.
    #[inline]
    pub fn transactions(&self) -> u32 {
        self.transactions
    }

    /// Transactions whose snapshot differed from the previous one.
    #[inline]
    pub fn changes(&self) -> u32 {
        self.changes
    }

    /// Consecutive transactions answered without a fresh read.
    #[inline]
    pub fn stalled(&self) -> u32 {
        self.stalled
    }

    /// Restarts requested so far.
    #[inline]
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Snapshot sent in the most recent transaction.
    #[inline]
    pub fn last(&self) -> Option<InputSnapshot> {
        self.last
    }

    /// Binding this monitor was created with.
    #[inline]
    pub fn binding(&self) -> &ResponderBinding<'a, S> {
        &self.binding
    }

    fn announce(&mut self, status: Status) {
        if self.announced != Some(status) {
            self.status.post(status);
            self.announced = Some(status);
        }
    }
}

impl<'a, S: SnapshotSource + ?Sized + 'a> ProtocolResponder<'a, S> for MonitorResponder<'a, S> {
    /// Mailbox the monitor posts status requests into.
    type Context = &'a StatusMailbox;

    fn bind(binding: ResponderBinding<'a, S>, status: &'a StatusMailbox) -> Self {
        Self {
            binding,
            status,
            last: None,
            announced: None,
            transactions: 0,
            changes: 0,
            stalled: 0,
            restarts: 0,
        }
    }

    fn serve_transaction(&mut self) -> InputSnapshot {
        let Some(snapshot) = self.binding.try_latest(Self::READ_ATTEMPTS) else {
            self.transactions = self.transactions.wrapping_add(1);
            self.stalled += 1;
            if self.stalled >= Self::RESTART_AFTER {
                self.stalled = 0;
                self.restarts = self.restarts.wrapping_add(1);
                self.announce(Status::Error);
                self.binding.restart();
            }
            return self.last.unwrap_or(InputSnapshot::RELEASED);
        };
        self.stalled = 0;

        let first = self.last.is_none();
        if self.last.is_some_and(|prev| prev != snapshot) {
            self.changes = self.changes.wrapping_add(1);
        }
        self.last = Some(snapshot);
        self.transactions = self.transactions.wrapping_add(1);

        if first {
            self.announce(Status::Ready);
        } else {
            self.announce(Status::Polling);
        }

        snapshot
    }
}
