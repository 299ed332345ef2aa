//! Hardware Abstraction Layer for the pad emulator.
//!
//! Thin seams between the pipeline and physical lines.
//! Business logic stays in core modules, HAL is just I/O.

pub mod gpio;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use gpio::{LineReader, PinBank};
