//! Configuration error types

/// Configuration error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// C01: More button lines than the pad has slots
    TooManyLines { given: usize },
    /// C02: Same physical line mapped twice
    DuplicateLine { line: u8 },
    /// C03: Line number beyond the GPIO range
    LineOutOfRange { line: u8 },
    /// C04: Sampling interval of zero would spin the producer core
    ZeroSampleInterval,
    /// C05: Indicator shares a line with a button
    IndicatorConflict { line: u8 },
}

impl ConfigError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooManyLines { .. } => "C01",
            Self::DuplicateLine { .. } => "C02",
            Self::LineOutOfRange { .. } => "C03",
            Self::ZeroSampleInterval => "C04",
            Self::IndicatorConflict { .. } => "C05",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooManyLines { .. } => "too many button lines",
            Self::DuplicateLine { .. } => "line mapped twice",
            Self::LineOutOfRange { .. } => "line out of range",
            Self::ZeroSampleInterval => "sample interval must be non-zero",
            Self::IndicatorConflict { .. } => "indicator line used by a button",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        match self {
            Self::TooManyLines { given } => write!(f, " ({})", given),
            Self::DuplicateLine { line }
            | Self::LineOutOfRange { line }
            | Self::IndicatorConflict { line } => write!(f, " (line {})", line),
            Self::ZeroSampleInterval => Ok(()),
        }
    }
}
