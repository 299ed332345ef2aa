//! Status annunciator: blink patterns on a single indicator line.
//!
//! Pure logic driven by a millisecond clock passed in by the caller.
//! Fully testable on host.
//!
//! # Patterns
//!
//! | Status      | Pattern                           | Timing                      |
//! |-------------|-----------------------------------|-----------------------------|
//! | Idle        | off                               | -                           |
//! | Ready       | continuous on/off                 | 200 ms per half-cycle       |
//! | Polling     | 2 blinks, pause                   | 100 ms half-cycle, 300 ms   |
//! | Configuring | 3 blinks, pause                   | 100 ms half-cycle, 300 ms   |
//! | Error       | continuous fast on/off            | 50 ms per half-cycle        |
//!
//! Every toggle restarts the timer at the tick that performed it, so timing
//! error never accumulates across cycles.

use embedded_hal::digital::OutputPin;

/// Status levels the annunciator can show.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Status {
    /// Waiting for the device to come up
    #[default]
    Idle = 0,
    /// Ready to answer the host
    Ready = 1,
    /// Answering poll transactions
    Polling = 2,
    /// Host is configuring the pad
    Configuring = 3,
    /// Something upstream requested the error signal
    Error = 4,
}

impl Status {
    /// All statuses, in discriminant order.
    pub const ALL: [Status; 5] = [
        Status::Idle,
        Status::Ready,
        Status::Polling,
        Status::Configuring,
        Status::Error,
    ];

    /// Convert from raw u8 value.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Blink pattern for this status (`None` = held off).
    #[inline]
    pub const fn pattern(self) -> Option<BlinkPattern> {
        PATTERNS[self as usize]
    }

    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Ready => "ready",
            Status::Polling => "polling",
            Status::Configuring => "configuring",
            Status::Error => "error",
        }
    }
}

/// Timing shape of a blink pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlinkPattern {
    /// Duration of each on and each off phase.
    pub half_cycle_ms: u32,

    /// Blinks per burst; 0 = toggle forever with no pause.
    pub blinks: u8,

    /// Dark pause after a burst (unused when `blinks == 0`).
    pub pause_ms: u32,
}

impl BlinkPattern {
    /// Toggle forever at a fixed rate.
    pub const fn continuous(half_cycle_ms: u32) -> Self {
        Self {
            half_cycle_ms,
            blinks: 0,
            pause_ms: 0,
        }
    }

    /// `blinks` on/off pairs, then a dark pause, repeating.
    pub const fn burst(blinks: u8, half_cycle_ms: u32, pause_ms: u32) -> Self {
        Self {
            half_cycle_ms,
            blinks,
            pause_ms,
        }
    }

    #[inline]
    const fn has_pause(&self) -> bool {
        self.blinks > 0
    }
}

/// Pattern table, indexed by `Status` discriminant.
const PATTERNS: [Option<BlinkPattern>; 5] = [
    None,
    Some(BlinkPattern::continuous(200)),
    Some(BlinkPattern::burst(2, 100, 300)),
    Some(BlinkPattern::burst(3, 100, 300)),
    Some(BlinkPattern::continuous(50)),
];

/// Where the annunciator is inside the current pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashPhase {
    /// Toggling through the burst (or continuously)
    Flashing,
    /// Dark pause after a burst
    Pause,
}

/// Non-blocking blink state machine owning the indicator line.
///
/// Every call is O(1) and writes the indicator at most once.
pub struct StatusAnnunciator<P: OutputPin> {
    indicator: P,
    current_status: Status,
    last_update_ms: u32,
    flash_count: u8,
    flash_phase: FlashPhase,
    indicator_on: bool,
}

impl<P: OutputPin> StatusAnnunciator<P> {
    /// Take over the indicator line, drive it off, start in `Idle`.
    pub fn new(mut indicator: P, now_ms: u32) -> Self {
        let _ = indicator.set_low();
        Self {
            indicator,
            current_status: Status::Idle,
            last_update_ms: now_ms,
            flash_count: 0,
            flash_phase: FlashPhase::Flashing,
            indicator_on: false,
        }
    }

    /// Request a status.
    ///
    /// A different status restarts its pattern from a dark indicator with
    /// the timer at `now_ms`. The status already shown is a no-op.
    ///
    /// Returns `true` if the status changed.
    pub fn set_status(&mut self, status: Status, now_ms: u32) -> bool {
        if status == self.current_status {
            return false;
        }

        self.current_status = status;
        self.flash_count = 0;
        self.flash_phase = FlashPhase::Flashing;
        self.drive(false);
        self.last_update_ms = now_ms;
        true
    }

    /// Advance the pattern to `now_ms`.
    ///
    /// Returns the new indicator level if this tick changed it.
    pub fn tick(&mut self, now_ms: u32) -> Option<bool> {
        let elapsed = now_ms.wrapping_sub(self.last_update_ms);

        let Some(pattern) = self.current_status.pattern() else {
            // Held off
            if self.indicator_on {
                self.drive(false);
                return Some(false);
            }
            return None;
        };

        match self.flash_phase {
            FlashPhase::Flashing => {
                if elapsed < pattern.half_cycle_ms {
                    return None;
                }

                let on = !self.indicator_on;
                self.drive(on);
                self.last_update_ms = now_ms;

                if !on && pattern.has_pause() {
                    self.flash_count += 1;
                    if self.flash_count >= pattern.blinks {
                        self.flash_phase = FlashPhase::Pause;
                    }
                }
                Some(on)
            }
            FlashPhase::Pause => {
                if elapsed < pattern.pause_ms {
                    return None;
                }

                // Indicator is already dark: restart the burst silently
                self.flash_count = 0;
                self.flash_phase = FlashPhase::Flashing;
                self.last_update_ms = now_ms;
                None
            }
        }
    }

    fn drive(&mut self, on: bool) {
        // Indicator failures are cosmetic
        let _ = if on {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        };
        self.indicator_on = on;
    }

    /// Status currently shown.
    #[inline]
    pub fn status(&self) -> Status {
        self.current_status
    }

    /// Check if the indicator is currently lit.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.indicator_on
    }

    /// Completed blinks in the current burst.
    #[inline]
    pub fn flash_count(&self) -> u8 {
        self.flash_count
    }

    /// Current phase inside the pattern.
    #[inline]
    pub fn flash_phase(&self) -> FlashPhase {
        self.flash_phase
    }

    /// Timestamp of the last visible transition or pattern restart.
    #[inline]
    pub fn last_update_ms(&self) -> u32 {
        self.last_update_ms
    }

    /// Indicator line.
    #[inline]
    pub fn indicator(&self) -> &P {
        &self.indicator
    }

    /// Release the indicator line.
    pub fn into_indicator(self) -> P {
        self.indicator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct Led {
        high: bool,
        writes: u32,
    }

    impl ErrorType for Led {
        type Error = Infallible;
    }

    impl OutputPin for Led {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_starts_idle_and_dark() {
        let ann = StatusAnnunciator::new(Led::default(), 0);
        assert_eq!(ann.status(), Status::Idle);
        assert!(!ann.is_on());
        assert!(!ann.indicator().high);
    }

    #[test]
    fn test_idle_never_lights() {
        let mut ann = StatusAnnunciator::new(Led::default(), 0);
        for t in (0..2000).step_by(10) {
            assert_eq!(ann.tick(t), None);
        }
        assert!(!ann.indicator().high);
    }

    #[test]
    fn test_ready_toggles_every_200ms() {
        let mut ann = StatusAnnunciator::new(Led::default(), 0);
        ann.set_status(Status::Ready, 0);

        assert_eq!(ann.tick(199), None);
        assert_eq!(ann.tick(200), Some(true));
        assert_eq!(ann.tick(399), None);
        assert_eq!(ann.tick(400), Some(false));
        assert_eq!(ann.tick(600), Some(true));
        assert_eq!(ann.flash_phase(), FlashPhase::Flashing);
    }

    #[test]
    fn test_error_toggles_every_50ms() {
        let mut ann = StatusAnnunciator::new(Led::default(), 1000);
        ann.set_status(Status::Error, 1000);

        let mut levels = Vec::new();
        for t in [1050, 1100, 1150, 1200] {
            levels.push(ann.tick(t));
        }
        assert_eq!(levels, vec![Some(true), Some(false), Some(true), Some(false)]);
    }

    #[test]
    fn test_configuring_three_blinks_then_pause() {
        let mut ann = StatusAnnunciator::new(Led::default(), 0);
        ann.set_status(Status::Configuring, 0);

        let mut t = 0;
        for expected in [true, false, true, false, true, false] {
            t += 100;
            assert_eq!(ann.tick(t), Some(expected));
        }
        assert_eq!(ann.flash_phase(), FlashPhase::Pause);

        // Pause holds
        assert_eq!(ann.tick(t + 100), None);
        assert_eq!(ann.tick(t + 299), None);
        // Pause ends silently, burst restarts
        assert_eq!(ann.tick(t + 300), None);
        assert_eq!(ann.flash_phase(), FlashPhase::Flashing);
        assert_eq!(ann.tick(t + 400), Some(true));
    }

    #[test]
    fn test_same_status_is_noop() {
        let mut ann = StatusAnnunciator::new(Led::default(), 0);
        assert!(ann.set_status(Status::Polling, 0));
        ann.tick(100);
        ann.tick(200);
        assert_eq!(ann.flash_count(), 1);

        let writes = ann.indicator().writes;
        assert!(!ann.set_status(Status::Polling, 250));
        assert_eq!(ann.flash_count(), 1);
        assert_eq!(ann.last_update_ms(), 200);
        assert_eq!(ann.indicator().writes, writes);
    }

    #[test]
    fn test_status_change_forces_dark() {
        let mut ann = StatusAnnunciator::new(Led::default(), 0);
        ann.set_status(Status::Error, 0);
        assert_eq!(ann.tick(50), Some(true));
        assert!(ann.indicator().high);

        assert!(ann.set_status(Status::Ready, 60));
        assert!(!ann.is_on());
        assert!(!ann.indicator().high);
        assert_eq!(ann.flash_count(), 0);
        assert_eq!(ann.last_update_ms(), 60);

        // New pattern timed from the change
        assert_eq!(ann.tick(259), None);
        assert_eq!(ann.tick(260), Some(true));
    }

    #[test]
    fn test_clock_wraparound() {
        let start = u32::MAX - 50;
        let mut ann = StatusAnnunciator::new(Led::default(), start);
        ann.set_status(Status::Polling, start);
        assert_eq!(ann.tick(start.wrapping_add(100)), Some(true));
    }

    #[test]
    fn test_status_from_u8() {
        assert_eq!(Status::from_u8(2), Some(Status::Polling));
        assert_eq!(Status::from_u8(4), Some(Status::Error));
        assert_eq!(Status::from_u8(5), None);
    }
}
