//! # psx-pad-emulator
//!
//! Dual-core PlayStation pad emulator core.
//!
//! ## Architecture
//!
//! One core samples the button lines and publishes an [`InputSnapshot`]
//! through a [`SharedStateBuffer`] (seqlock). The other core runs the
//! protocol responder, which reads the latest snapshot once per host
//! transaction. Neither side ever blocks the other.
//!
//! ```text
//! lines → InputPoller → InputSnapshot → SharedStateBuffer ══▶ ProtocolResponder
//!                                                                  │
//! indicator ◀── StatusAnnunciator ◀──────── StatusMailbox ◀────────┘
//! ```
//!
//! Shared state is created by the startup routine and passed down by
//! reference; the library holds no globals.

#![cfg_attr(not(test), no_std)]

pub mod annunciator;
pub mod config;
pub mod hal;
pub mod log_drain;
pub mod logging;
pub mod mailbox;
pub mod poller;
pub mod producer;
pub mod responder;
pub mod seqlock;
pub mod snapshot;

pub(crate) mod sync;

pub use annunciator::{BlinkPattern, FlashPhase, Status, StatusAnnunciator};
pub use config::{ConfigError, EmulatorConfig, LineMap};
pub use hal::{LineReader, PinBank};
pub use log_drain::LogDrain;
pub use logging::{LogLevel, LogStream};
pub use mailbox::StatusMailbox;
pub use poller::InputPoller;
pub use producer::ProducerCore;
pub use responder::{MonitorResponder, ProtocolResponder, ResponderBinding, SnapshotSource};
pub use seqlock::{ReadContended, ReadDiagnostics, SharedStateBuffer};
pub use snapshot::{Button, ButtonGroup, InputSnapshot, PressedButtons};
