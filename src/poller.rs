//! Input sampling for the producer core.
//!
//! Pure logic over a `LineReader`: every cycle samples each configured line
//! once, builds the pressed set from scratch (nothing latches between cycles),
//! packs it with `InputSnapshot::encode` and publishes the result.
//!
//! Debouncing is the sampling interval itself: the loop samples every
//! ~1 ms and publishes whatever the lines read at that instant.

use crate::config::LineMap;
use crate::hal::LineReader;
use crate::seqlock::SharedStateBuffer;
use crate::snapshot::{InputSnapshot, PressedButtons};

/// Maps physical lines to snapshot fields and publishes them.
pub struct InputPoller {
    map: LineMap,

    /// Last snapshot this poller produced.
    last: InputSnapshot,

    /// Completed sampling cycles (wrapping).
    cycles: u32,
}

impl InputPoller {
    /// Create a poller for the given line map.
    pub const fn new(map: LineMap) -> Self {
        Self {
            map,
            last: InputSnapshot::RELEASED,
            cycles: 0,
        }
    }

    /// Sample every configured line once.
    ///
    /// Unconfigured slots contribute nothing, so their buttons stay released.
    pub fn sample<R: LineReader + ?Sized>(&self, lines: &mut R) -> PressedButtons {
        let mut pressed = PressedButtons::NONE;
        for (button, line) in self.map.iter() {
            if lines.is_asserted(line) {
                pressed = pressed.with(button);
            }
        }
        pressed
    }

    /// Sample and pack one snapshot without publishing it.
    #[inline]
    pub fn poll<R: LineReader + ?Sized>(&mut self, lines: &mut R) -> InputSnapshot {
        let snapshot = InputSnapshot::encode(self.sample(lines));
        self.last = snapshot;
        self.cycles = self.cycles.wrapping_add(1);
        snapshot
    }

    /// One full cycle: sample, pack, publish.
    ///
    /// # Timing
    ///
    /// O(configured lines) line reads plus one seqlock write. Never blocks.
    #[inline]
    pub fn poll_and_publish<R: LineReader + ?Sized>(
        &mut self,
        lines: &mut R,
        buffer: &SharedStateBuffer,
    ) -> InputSnapshot {
        let snapshot = self.poll(lines);
        buffer.write(&snapshot);
        snapshot
    }

    /// Last snapshot produced by `poll`.
    #[inline]
    pub fn last(&self) -> InputSnapshot {
        self.last
    }

    /// Number of completed cycles.
    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Line map in use.
    #[inline]
    pub fn map(&self) -> &LineMap {
        &self.map
    }
}
