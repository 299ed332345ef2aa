//! Status annunciator pattern tests

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use psx_pad_emulator::{BlinkPattern, FlashPhase, Status, StatusAnnunciator};

/// Indicator that records every level change with the time it happened.
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

/// Tick every millisecond in `from..=to`, collecting (time, level) edges.
fn edges(ann: &mut StatusAnnunciator<Led>, from: u32, to: u32) -> Vec<(u32, bool)> {
    (from..=to)
        .filter_map(|t| ann.tick(t).map(|on| (t, on)))
        .collect()
}

#[test]
fn test_polling_scenario() {
    let mut ann = StatusAnnunciator::new(Led::default(), 0);
    ann.set_status(Status::Polling, 0);

    // 100 ms steps: on, off, on, off
    assert_eq!(ann.tick(100), Some(true));
    assert_eq!(ann.tick(200), Some(false));
    assert_eq!(ann.tick(300), Some(true));
    assert_eq!(ann.tick(400), Some(false));
    assert_eq!(ann.flash_phase(), FlashPhase::Pause);

    // 300 ms pause: no visible change
    assert_eq!(ann.tick(700), None);
    assert!(!ann.indicator().high);

    // Burst repeats
    assert_eq!(ann.tick(800), Some(true));
    assert!(ann.indicator().high);
}

#[test]
fn test_polling_timeline_at_1ms() {
    let mut ann = StatusAnnunciator::new(Led::default(), 0);
    ann.set_status(Status::Polling, 0);

    assert_eq!(
        edges(&mut ann, 1, 1500),
        vec![
            (100, true),
            (200, false),
            (300, true),
            (400, false),
            (800, true),
            (900, false),
            (1000, true),
            (1100, false),
            (1500, true),
        ]
    );
}

#[test]
fn test_configuring_timeline_at_1ms() {
    let mut ann = StatusAnnunciator::new(Led::default(), 0);
    ann.set_status(Status::Configuring, 0);

    let got = edges(&mut ann, 1, 1000);
    assert_eq!(
        got,
        vec![
            (100, true),
            (200, false),
            (300, true),
            (400, false),
            (500, true),
            (600, false),
            (1000, true),
        ]
    );
}

#[test]
fn test_ready_has_no_pause() {
    let mut ann = StatusAnnunciator::new(Led::default(), 0);
    ann.set_status(Status::Ready, 0);

    let got = edges(&mut ann, 1, 2000);
    assert_eq!(got.len(), 10);
    assert!(got.iter().enumerate().all(|(i, &(t, on))| {
        t == 200 * (i as u32 + 1) && on == (i % 2 == 0)
    }));
}

#[test]
fn test_idle_holds_off() {
    let mut ann = StatusAnnunciator::new(Led::default(), 0);
    ann.set_status(Status::Error, 0);
    ann.tick(50);
    assert!(ann.indicator().high);

    ann.set_status(Status::Idle, 60);
    assert!(!ann.indicator().high);
    assert!(edges(&mut ann, 61, 3000).is_empty());
}

#[test]
fn test_set_status_idempotent() {
    let mut ann = StatusAnnunciator::new(Led::default(), 0);
    ann.set_status(Status::Configuring, 0);
    ann.tick(100);
    ann.tick(200);
    ann.tick(300);

    let count = ann.flash_count();
    let phase = ann.flash_phase();
    let since = ann.last_update_ms();
    let writes = ann.indicator().writes;
    let lit = ann.is_on();

    assert!(!ann.set_status(Status::Configuring, 350));

    assert_eq!(ann.flash_count(), count);
    assert_eq!(ann.flash_phase(), phase);
    assert_eq!(ann.last_update_ms(), since);
    assert_eq!(ann.indicator().writes, writes);
    assert_eq!(ann.is_on(), lit);

    // Pattern continues as if nothing happened
    assert_eq!(ann.tick(400), Some(false));
}

#[test]
fn test_every_change_resets_progress() {
    let shown = [Status::Ready, Status::Polling, Status::Configuring, Status::Error];

    for from in shown {
        for to in Status::ALL.into_iter().filter(|&s| s != from) {
            let mut ann = StatusAnnunciator::new(Led::default(), 0);
            assert!(ann.set_status(from, 0));
            edges(&mut ann, 1, 250);

            // Mid-pattern: bursts have one blink done, continuous ones are lit
            let burst = matches!(from, Status::Polling | Status::Configuring);
            let half = from.pattern().map_or(1, |p| p.half_cycle_ms);
            assert_eq!(ann.flash_count(), u8::from(burst), "{:?}", from);
            assert_eq!(ann.is_on(), !burst, "{:?}", from);
            assert_eq!(ann.last_update_ms(), 250 / half * half, "{:?}", from);

            assert!(ann.set_status(to, 260), "{:?} -> {:?}", from, to);
            assert_eq!(ann.status(), to);
            assert!(!ann.is_on(), "{:?} -> {:?}", from, to);
            assert!(!ann.indicator().high);
            assert_eq!(ann.flash_count(), 0);
            assert_eq!(ann.flash_phase(), FlashPhase::Flashing);
            assert_eq!(ann.last_update_ms(), 260);
        }
    }
}

#[test]
fn test_pattern_table() {
    assert_eq!(Status::Idle.pattern(), None);
    assert_eq!(Status::Ready.pattern(), Some(BlinkPattern::continuous(200)));
    assert_eq!(Status::Polling.pattern(), Some(BlinkPattern::burst(2, 100, 300)));
    assert_eq!(Status::Configuring.pattern(), Some(BlinkPattern::burst(3, 100, 300)));
    assert_eq!(Status::Error.pattern(), Some(BlinkPattern::continuous(50)));
}
