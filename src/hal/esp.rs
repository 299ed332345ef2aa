//! ESP-IDF line adapters over the raw GPIO driver.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use esp_idf_svc::sys::{self, esp, EspError};

use super::gpio::LineReader;
use crate::config::LineMap;

/// Button lines read straight from the GPIO input register.
pub struct SysLines;

impl SysLines {
    /// Configure every mapped line as an input with pull-up.
    pub fn configure(map: &LineMap) -> Result<Self, EspError> {
        for (_, line) in map.iter() {
            let pin = line as i32;
            // SAFETY: Plain ESP-IDF driver calls on a validated line number
            unsafe {
                esp!(sys::gpio_reset_pin(pin))?;
                esp!(sys::gpio_set_direction(pin, sys::gpio_mode_t_GPIO_MODE_INPUT))?;
                esp!(sys::gpio_set_pull_mode(pin, sys::gpio_pull_mode_t_GPIO_PULLUP_ONLY))?;
            }
        }
        Ok(Self)
    }
}

impl LineReader for SysLines {
    #[inline]
    fn is_asserted(&mut self, line: u8) -> bool {
        // SAFETY: Read-only register access
        unsafe { sys::gpio_get_level(line as i32) == 0 }
    }
}

/// Status indicator output line.
pub struct SysIndicator {
    pin: i32,
}

impl SysIndicator {
    /// Configure `line` as an output, initially low.
    pub fn configure(line: u8) -> Result<Self, EspError> {
        let pin = line as i32;
        // SAFETY: Plain ESP-IDF driver calls on a validated line number
        unsafe {
            esp!(sys::gpio_reset_pin(pin))?;
            esp!(sys::gpio_set_direction(pin, sys::gpio_mode_t_GPIO_MODE_OUTPUT))?;
            esp!(sys::gpio_set_level(pin, 0))?;
        }
        Ok(Self { pin })
    }
}

impl ErrorType for SysIndicator {
    type Error = Infallible;
}

impl OutputPin for SysIndicator {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        // SAFETY: Line configured as output in `configure`
        unsafe {
            sys::gpio_set_level(self.pin, 0);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        // SAFETY: Line configured as output in `configure`
        unsafe {
            sys::gpio_set_level(self.pin, 1);
        }
        Ok(())
    }
}
