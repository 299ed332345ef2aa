//! Atomic primitives used across the crate.
//!
//! Cores without native read-modify-write atomics (Cortex-M0+ and friends)
//! enable the `portable-atomic` feature; everything else uses `core`.

#[cfg(not(feature = "portable-atomic"))]
pub use core::sync::atomic::{fence, AtomicU32, AtomicU8, Ordering};

#[cfg(feature = "portable-atomic")]
pub use portable_atomic::{fence, AtomicU32, AtomicU8, Ordering};
