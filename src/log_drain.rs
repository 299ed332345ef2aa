//! Log drain: turns queued entries into text lines.
//!
//! Runs wherever blocking output is acceptable (UART task on the device,
//! stdout on the host). Output format, one entry per line:
//!
//! ```text
//! [      1234] INFO: status -> polling
//! ```
//!
//! Streams are drained in the order given; the caller lists the producer
//! core first so its entries are never starved by the responder core.

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream, SliceWriter};

/// Scratch size for one formatted line.
pub const LINE_BUF_LEN: usize = 160;

/// Default interval between dropped-message reports.
pub const DROP_REPORT_INTERVAL_MS: u32 = 10_000;

/// Format `entry` as `[timestamp_ms] LEVEL: message\n`.
///
/// Returns the number of bytes written; output is truncated to `buf`.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = SliceWriter::new(buf);
    let _ = writeln!(
        writer,
        "[{:10}] {}: {}",
        entry.timestamp_ms,
        entry.level.as_str(),
        entry.text()
    );
    writer.len()
}

/// Drains a fixed set of streams and reports drops periodically.
pub struct LogDrain {
    report_interval_ms: u32,
    last_report_ms: u32,
}

impl LogDrain {
    /// Create a drain reporting drops every `report_interval_ms`.
    pub const fn new(report_interval_ms: u32, now_ms: u32) -> Self {
        Self {
            report_interval_ms,
            last_report_ms: now_ms,
        }
    }

    /// Drain every stream to `sink`, one line per call.
    ///
    /// Once per report interval, streams that dropped messages since the
    /// last report produce one extra `WARN` line listing the counts by
    /// stream index.
    ///
    /// Returns the number of entries written (the drop report not counted).
    pub fn drain_into<const N: usize, F>(
        &mut self,
        streams: &[&LogStream<N>],
        now_ms: u32,
        mut sink: F,
    ) -> usize
    where
        F: FnMut(&[u8]),
    {
        let mut line = [0u8; LINE_BUF_LEN];
        let mut written = 0;

        for stream in streams {
            while let Some(entry) = stream.drain() {
                let len = format_log_entry(&entry, &mut line);
                sink(&line[..len]);
                written += 1;
            }
        }

        if now_ms.wrapping_sub(self.last_report_ms) >= self.report_interval_ms {
            self.last_report_ms = now_ms;
            if streams.iter().any(|s| s.dropped() > 0) {
                let len = format_drop_report(streams, now_ms, &mut line);
                sink(&line[..len]);
            }
        }

        written
    }
}

impl Default for LogDrain {
    fn default() -> Self {
        Self::new(DROP_REPORT_INTERVAL_MS, 0)
    }
}

fn format_drop_report<const N: usize>(
    streams: &[&LogStream<N>],
    now_ms: u32,
    buf: &mut [u8],
) -> usize {
    let mut writer = SliceWriter::new(buf);
    let _ = write!(writer, "[{:10}] WARN: dropped:", now_ms);
    for (idx, stream) in streams.iter().enumerate() {
        let _ = write!(writer, " core{}={}", idx, stream.take_dropped());
    }
    let _ = writer.write_str("\n");
    writer.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MAX_MSG_LEN};

    fn entry(timestamp_ms: u32, level: LogLevel, text: &[u8]) -> LogEntry {
        let mut msg = [0u8; MAX_MSG_LEN];
        msg[..text.len()].copy_from_slice(text);
        LogEntry {
            timestamp_ms,
            level,
            len: text.len() as u8,
            msg,
        }
    }

    fn collect<const N: usize>(drain: &mut LogDrain, streams: &[&LogStream<N>], now_ms: u32) -> Vec<String> {
        let mut lines = Vec::new();
        drain.drain_into(streams, now_ms, |bytes| {
            lines.push(String::from_utf8(bytes.to_vec()).unwrap())
        });
        lines
    }

    #[test]
    fn test_format_log_entry() {
        let mut buf = [0u8; LINE_BUF_LEN];
        let len = format_log_entry(&entry(1234567, LogLevel::Info, b"boot"), &mut buf);
        assert_eq!(&buf[..len], b"[   1234567] INFO: boot\n");
    }

    #[test]
    fn test_format_uses_len_only() {
        let mut e = entry(999, LogLevel::Error, b"TEST12345X");
        e.len = 5;

        let mut buf = [0u8; LINE_BUF_LEN];
        let len = format_log_entry(&e, &mut buf);
        let formatted = core::str::from_utf8(&buf[..len]).unwrap();
        assert!(formatted.contains("ERROR: TEST1\n"));
        assert!(!formatted.contains('X'));
    }

    #[test]
    fn test_producer_stream_first() {
        let producer = LogStream::<8>::new();
        let responder = LogStream::<8>::new();
        responder.push(1, LogLevel::Info, b"responder");
        producer.push(2, LogLevel::Info, b"producer");

        let mut drain = LogDrain::new(DROP_REPORT_INTERVAL_MS, 0);
        let lines = collect(&mut drain, &[&producer, &responder], 5);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO: producer\n"));
        assert!(lines[1].ends_with("INFO: responder\n"));
    }

    #[test]
    fn test_drop_report_once_per_interval() {
        let producer = LogStream::<2>::new();
        let responder = LogStream::<2>::new();
        for t in 0..5 {
            producer.push(t, LogLevel::Debug, b"x");
        }
        assert_eq!(producer.dropped(), 3);

        let mut drain = LogDrain::new(1000, 0);

        // Interval not elapsed: entries only
        let lines = collect(&mut drain, &[&producer, &responder], 500);
        assert_eq!(lines.len(), 2);

        let lines = collect(&mut drain, &[&producer, &responder], 1000);
        assert_eq!(lines, vec!["[      1000] WARN: dropped: core0=3 core1=0\n".to_string()]);
        assert_eq!(producer.dropped(), 0);

        // Nothing dropped since: no report
        let lines = collect(&mut drain, &[&producer, &responder], 2000);
        assert!(lines.is_empty());
    }
}
