//! Module: config
//!
//! Purpose: Static configuration for the pad emulator.
//!
//! Architecture:
//! - `LineMap`: button slot → physical line table (reference wiring by default)
//! - `EmulatorConfig`: line map, sampling cadence and indicator line
//! - Built once by the startup routine, validated, then handed out by reference
//!
//! Safety: Safe. Plain data, no atomics, no persistence.

mod error;
mod line_map;

pub use error::ConfigError;
pub use line_map::{LineMap, MAX_BUTTON_LINES, MAX_LINE_NUMBER};

/// Default producer sampling interval.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u32 = 1;

/// Default status indicator line (on-board LED).
pub const DEFAULT_INDICATOR_LINE: u8 = 25;

/// Status indicator line on ESP32-S3 boards.
pub const ESP32_S3_INDICATOR_LINE: u8 = 21;

/// Complete emulator configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Button slot → physical line.
    pub lines: LineMap,

    /// Delay between two sampling cycles on the producer core.
    pub sample_interval_ms: u32,

    /// Output line driven by the status annunciator.
    pub indicator_line: u8,
}

impl EmulatorConfig {
    /// Reference wiring with default timing.
    pub const fn reference() -> Self {
        Self {
            lines: LineMap::REFERENCE,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            indicator_line: DEFAULT_INDICATOR_LINE,
        }
    }

    /// ESP32-S3 wiring with default timing.
    pub const fn esp32_s3() -> Self {
        Self {
            lines: LineMap::ESP32_S3,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            indicator_line: ESP32_S3_INDICATOR_LINE,
        }
    }

    /// Scheduler ticks to wait between two cycles at `tick_rate_hz`.
    ///
    /// Rounds up, never below one tick.
    pub const fn sample_interval_ticks(&self, tick_rate_hz: u32) -> u32 {
        let ticks = (self.sample_interval_ms as u64 * tick_rate_hz as u64).div_ceil(1000);
        if ticks == 0 {
            1
        } else if ticks > u32::MAX as u64 {
            u32::MAX
        } else {
            ticks as u32
        }
    }

    /// Interval actually achieved at `tick_rate_hz`, in ms.
    ///
    /// Larger than `sample_interval_ms` when the tick is too coarse.
    pub const fn effective_interval_ms(&self, tick_rate_hz: u32) -> u32 {
        if tick_rate_hz == 0 {
            return u32::MAX;
        }
        let ms = (self.sample_interval_ticks(tick_rate_hz) as u64 * 1000).div_ceil(tick_rate_hz as u64);
        if ms > u32::MAX as u64 {
            u32::MAX
        } else {
            ms as u32
        }
    }

    /// Check the combination of settings.
    ///
    /// `LineMap` is already valid on its own; this checks what spans fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.indicator_line > MAX_LINE_NUMBER {
            return Err(ConfigError::LineOutOfRange {
                line: self.indicator_line,
            });
        }
        if self.lines.uses_line(self.indicator_line) {
            return Err(ConfigError::IndicatorConflict {
                line: self.indicator_line,
            });
        }
        Ok(())
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::reference()
    }
}
