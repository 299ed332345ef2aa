//! Module: producer
//!
//! Purpose: Everything the producer core does in one sampling cycle.
//!
//! Architecture:
//! - Owns the poller and the annunciator (both single-core, unsynchronized)
//! - Borrows the shared buffer, the status mailbox and its own log stream,
//!   all created by the startup routine
//! - `cycle(now_ms)`: sample → publish → apply pending status → tick indicator
//!
//! Safety: Safe. All cross-core traffic goes through `SharedStateBuffer` and
//! `StatusMailbox`.

use embedded_hal::digital::OutputPin;

use crate::annunciator::{Status, StatusAnnunciator};
use crate::config::EmulatorConfig;
use crate::hal::LineReader;
use crate::logging::LogStream;
use crate::mailbox::StatusMailbox;
use crate::poller::InputPoller;
use crate::seqlock::SharedStateBuffer;
use crate::snapshot::InputSnapshot;
use crate::{rt_debug, rt_info, rt_warn};

/// Producer-core context.
pub struct ProducerCore<'a, P: OutputPin> {
    poller: InputPoller,
    annunciator: StatusAnnunciator<P>,
    buffer: &'a SharedStateBuffer,
    mailbox: &'a StatusMailbox,
    log: &'a LogStream,

    /// Reader retry high-water mark already reported.
    reported_max_retries: u32,
}

impl<'a, P: OutputPin> ProducerCore<'a, P> {
    /// Build the context from a validated configuration.
    ///
    /// Takes over the indicator line (driven off) and logs the
    /// configuration summary.
    pub fn new(
        config: &EmulatorConfig,
        indicator: P,
        buffer: &'a SharedStateBuffer,
        mailbox: &'a StatusMailbox,
        log: &'a LogStream,
        now_ms: u32,
    ) -> Self {
        rt_info!(
            log,
            now_ms,
            "config: {} button lines, every {} ms, indicator on line {}",
            config.lines.configured(),
            config.sample_interval_ms,
            config.indicator_line
        );

        Self {
            poller: InputPoller::new(config.lines),
            annunciator: StatusAnnunciator::new(indicator, now_ms),
            buffer,
            mailbox,
            log,
            reported_max_retries: 0,
        }
    }

    /// Run one sampling cycle.
    ///
    /// # Timing
    ///
    /// One pass over the configured lines, one seqlock write, one mailbox
    /// swap, at most one indicator write. Never blocks.
    pub fn cycle<R: LineReader + ?Sized>(&mut self, lines: &mut R, now_ms: u32) -> InputSnapshot {
        let previous = self.poller.last();
        let snapshot = self.poller.poll_and_publish(lines, self.buffer);
        if snapshot != previous {
            rt_debug!(
                self.log,
                now_ms,
                "input {:02x} {:02x}",
                snapshot.buttons_group_a,
                snapshot.buttons_group_b
            );
        }

        if let Some(status) = self.mailbox.take() {
            self.set_status(status, now_ms);
        }

        self.annunciator.tick(now_ms);

        let max_retries = self.buffer.max_retries();
        if max_retries > self.reported_max_retries {
            self.reported_max_retries = max_retries;
            rt_warn!(self.log, now_ms, "reader retries high-water {}", max_retries);
        }

        snapshot
    }

    /// Request a status directly from the producer core.
    ///
    /// Returns `true` if the status changed.
    pub fn set_status(&mut self, status: Status, now_ms: u32) -> bool {
        let changed = self.annunciator.set_status(status, now_ms);
        if changed {
            rt_info!(self.log, now_ms, "status -> {}", status.as_str());
        }
        changed
    }

    /// Status currently shown.
    #[inline]
    pub fn status(&self) -> Status {
        self.annunciator.status()
    }

    #[inline]
    pub fn poller(&self) -> &InputPoller {
        &self.poller
    }

    #[inline]
    pub fn annunciator(&self) -> &StatusAnnunciator<P> {
        &self.annunciator
    }

    /// Buffer this core publishes into.
    #[inline]
    pub fn buffer(&self) -> &'a SharedStateBuffer {
        self.buffer
    }
}
