//! Button slot → physical line table.
//!
//! Slot order is fixed (see `Button`); a map built from fewer lines than
//! slots leaves the trailing slots unconfigured, and those buttons never assert.

use super::ConfigError;
use crate::snapshot::Button;

/// Maximum number of button lines (one per `Button`).
pub const MAX_BUTTON_LINES: usize = Button::COUNT;

/// Highest GPIO number accepted in a map.
pub const MAX_LINE_NUMBER: u8 = 63;

/// Ordered mapping from button slots to physical line numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineMap {
    lines: [Option<u8>; MAX_BUTTON_LINES],
}

impl LineMap {
    /// Reference wiring.
    ///
    /// ```text
    /// Circle 22  Cross 21  Triangle 20  Square 19
    /// L1 14      R1 12     L2 13        R2 11
    /// Up 18      Down 17   Left 16      Right 15
    /// Start 26   Select 27
    /// ```
    pub const REFERENCE: Self = Self {
        lines: [
            Some(22),
            Some(21),
            Some(20),
            Some(19),
            Some(14),
            Some(12),
            Some(13),
            Some(11),
            Some(18),
            Some(17),
            Some(16),
            Some(15),
            Some(26),
            Some(27),
        ],
    };

    /// ESP32-S3 wiring.
    ///
    /// Stays clear of the strapping pins (0, 3, 45, 46), USB (19, 20),
    /// SPI flash and octal PSRAM (26..=37), UART0 (43, 44) and the log
    /// UART (6).
    ///
    /// ```text
    /// Circle 4   Cross 5   Triangle 7   Square 15
    /// L1 16      R1 17     L2 18        R2 8
    /// Up 9       Down 10   Left 11      Right 12
    /// Start 13   Select 14
    /// ```
    pub const ESP32_S3: Self = Self {
        lines: [
            Some(4),
            Some(5),
            Some(7),
            Some(15),
            Some(16),
            Some(17),
            Some(18),
            Some(8),
            Some(9),
            Some(10),
            Some(11),
            Some(12),
            Some(13),
            Some(14),
        ],
    };

    /// Map with no configured lines: every button reads as released.
    pub const EMPTY: Self = Self {
        lines: [None; MAX_BUTTON_LINES],
    };

    /// Build from line numbers given in slot order.
    ///
    /// # Errors
    ///
    /// - `TooManyLines` if more than `MAX_BUTTON_LINES` are given
    /// - `LineOutOfRange` if a line exceeds `MAX_LINE_NUMBER`
    /// - `DuplicateLine` if a line appears twice
    pub fn from_lines(lines: &[u8]) -> Result<Self, ConfigError> {
        if lines.len() > MAX_BUTTON_LINES {
            return Err(ConfigError::TooManyLines { given: lines.len() });
        }

        let mut map = Self::EMPTY;
        for (slot, &line) in lines.iter().enumerate() {
            if line > MAX_LINE_NUMBER {
                return Err(ConfigError::LineOutOfRange { line });
            }
            if lines[..slot].contains(&line) {
                return Err(ConfigError::DuplicateLine { line });
            }
            map.lines[slot] = Some(line);
        }

        Ok(map)
    }

    /// Physical line for a button, `None` if its slot is unconfigured.
    #[inline]
    pub fn line(&self, button: Button) -> Option<u8> {
        self.lines[button.slot()]
    }

    /// Number of configured slots.
    pub fn configured(&self) -> usize {
        self.lines.iter().filter(|l| l.is_some()).count()
    }

    /// Check if a physical line is used by any slot.
    pub fn uses_line(&self, line: u8) -> bool {
        self.lines.contains(&Some(line))
    }

    /// Configured (button, line) pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Button, u8)> + '_ {
        Button::ALL
            .into_iter()
            .zip(self.lines.iter())
            .filter_map(|(button, line)| line.map(|l| (button, l)))
    }
}

impl Default for LineMap {
    fn default() -> Self {
        Self::REFERENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_map() {
        let map = LineMap::REFERENCE;
        assert_eq!(map.configured(), 14);
        assert_eq!(map.line(Button::Circle), Some(22));
        assert_eq!(map.line(Button::R2), Some(11));
        assert_eq!(map.line(Button::Select), Some(27));
    }

    #[test]
    fn test_esp32_s3_map_avoids_reserved_pins() {
        // Strapping, USB, flash/PSRAM, UART0, log UART
        let reserved = [0u8, 3, 45, 46, 19, 20, 43, 44, 6]
            .into_iter()
            .chain(26..=37);

        let map = LineMap::ESP32_S3;
        assert_eq!(map.configured(), 14);
        for line in reserved {
            assert!(!map.uses_line(line), "line {} is reserved", line);
        }
        // S3 has no GPIO 22..=25
        assert!(map.iter().all(|(_, line)| line <= 21 || line >= 38));

        let lines: Vec<u8> = map.iter().map(|(_, line)| line).collect();
        assert_eq!(LineMap::from_lines(&lines), Ok(map));
    }

    #[test]
    fn test_short_map_leaves_tail_unconfigured() {
        let map = LineMap::from_lines(&[22, 21, 20]).unwrap();
        assert_eq!(map.configured(), 3);
        assert_eq!(map.line(Button::Triangle), Some(20));
        assert_eq!(map.line(Button::Square), None);
        assert_eq!(map.line(Button::Select), None);
    }

    #[test]
    fn test_too_many_lines() {
        let lines: Vec<u8> = (0..15).collect();
        assert_eq!(
            LineMap::from_lines(&lines),
            Err(ConfigError::TooManyLines { given: 15 })
        );
    }

    #[test]
    fn test_duplicate_line() {
        assert_eq!(
            LineMap::from_lines(&[5, 6, 5]),
            Err(ConfigError::DuplicateLine { line: 5 })
        );
    }

    #[test]
    fn test_line_out_of_range() {
        assert_eq!(
            LineMap::from_lines(&[1, 64]),
            Err(ConfigError::LineOutOfRange { line: 64 })
        );
    }

    #[test]
    fn test_iter_in_slot_order() {
        let map = LineMap::from_lines(&[9, 8]).unwrap();
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(Button::Circle, 9), (Button::Cross, 8)]);
        assert!(map.uses_line(8));
        assert!(!map.uses_line(7));
    }
}
