//! GPIO seams for button lines.

use embedded_hal::digital::InputPin;

/// Read access to physical input lines by line number.
///
/// Buttons are wired active-low with pull-ups: a line at logic 0 is
/// asserted (pressed).
pub trait LineReader {
    /// Check if `line` currently reads logic 0.
    ///
    /// Unknown lines and read errors report `false` (not pressed).
    fn is_asserted(&mut self, line: u8) -> bool;
}

impl<T: LineReader + ?Sized> LineReader for &mut T {
    #[inline]
    fn is_asserted(&mut self, line: u8) -> bool {
        (**self).is_asserted(line)
    }
}

/// Fixed set of `embedded-hal` input pins, each tagged with its line number.
pub struct PinBank<P, const N: usize> {
    pins: [(u8, P); N],
}

impl<P: InputPin, const N: usize> PinBank<P, N> {
    /// Create a bank from (line number, pin) pairs.
    pub fn new(pins: [(u8, P); N]) -> Self {
        Self { pins }
    }

    /// Get mutable access to the pin for `line`.
    pub fn pin_mut(&mut self, line: u8) -> Option<&mut P> {
        self.pins
            .iter_mut()
            .find(|(l, _)| *l == line)
            .map(|(_, p)| p)
    }
}

impl<P: InputPin, const N: usize> LineReader for PinBank<P, N> {
    #[inline]
    fn is_asserted(&mut self, line: u8) -> bool {
        // A fallible pin that errors counts as released
        self.pin_mut(line)
            .map(|pin| pin.is_low().unwrap_or(false))
            .unwrap_or(false)
    }
}
