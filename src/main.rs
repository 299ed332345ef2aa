//! psx-pad-emulator entry point.
//!
//! On ESP-IDF:
//! 1. Bring up the log UART and the GPIO lines
//! 2. Start the responder task pinned to core 1
//! 3. Run the producer loop on core 0, one cycle per sample interval
//!
//! On the host the same pipeline runs as a bench: simulated lines, a
//! producer thread and a responder thread, logs printed to stdout.

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    esp_idf_svc::sys::link_patches();
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    bench::run(bench::duration_from_args());
}

#[cfg(target_os = "espidf")]
mod firmware {
    use core::ffi::c_void;
    use core::ptr;

    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartTxDriver};
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::sys::{self, EspError};

    use psx_pad_emulator::hal::esp::{SysIndicator, SysLines};
    use psx_pad_emulator::log_drain::DROP_REPORT_INTERVAL_MS;
    use psx_pad_emulator::{
        rt_debug, rt_error, rt_info, rt_warn, EmulatorConfig, LogDrain, LogStream,
        MonitorResponder, ProducerCore, ProtocolResponder, ResponderBinding, SharedStateBuffer,
        StatusMailbox,
    };

    // Cross-core state. Lives for the whole run; handed to each side by reference.
    static BUFFER: SharedStateBuffer = SharedStateBuffer::new();
    static MAILBOX: StatusMailbox = StatusMailbox::new();
    static PRODUCER_LOG: LogStream = LogStream::new();
    static RESPONDER_LOG: LogStream = LogStream::new();

    const RESPONDER_CORE: i32 = 1;
    const RESPONDER_PRIORITY: u32 = 10;
    const RESPONDER_STACK: u32 = 4096;

    /// Stand-in host poll period (one frame at 60 Hz).
    const TRANSACTION_PERIOD_MS: u32 = 16;

    const LOG_BAUD: u32 = 115_200;
    const DRAIN_STACK: usize = 4096;
    const DRAIN_IDLE_MS: u32 = 10;

    const PD_PASS: i32 = 1;

    fn now_ms() -> u32 {
        // SAFETY: esp_timer is running from boot
        (unsafe { sys::esp_timer_get_time() } / 1000) as u32
    }

    fn delay_ticks(ticks: u32) {
        // SAFETY: Called from a task context
        unsafe { sys::vTaskDelay(ticks.max(1)) };
    }

    fn delay_ms(ms: u32) {
        delay_ticks(ms.saturating_mul(sys::configTICK_RATE_HZ) / 1000);
    }

    pub fn run() -> Result<(), EspError> {
        let peripherals = Peripherals::take()?;

        // UART1 TX only on GPIO6
        let uart = UartTxDriver::new(
            peripherals.uart1,
            peripherals.pins.gpio6,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &UartConfig::default().baudrate(Hertz(LOG_BAUD)),
        )?;

        std::thread::Builder::new()
            .stack_size(DRAIN_STACK)
            .spawn(move || drain_task(uart))
            .map_err(|_| EspError::from_infallible::<{ sys::ESP_ERR_NO_MEM as i32 }>())?;

        rt_info!(PRODUCER_LOG, now_ms(), "{}", env!("VERSION_STRING"));

        let config = EmulatorConfig::esp32_s3();
        if let Err(err) = config.validate() {
            rt_error!(PRODUCER_LOG, now_ms(), "config rejected: {}", err);
            return Err(EspError::from_infallible::<{ sys::ESP_ERR_INVALID_ARG as i32 }>());
        }

        let cycle_ticks = config.sample_interval_ticks(sys::configTICK_RATE_HZ);
        let effective_ms = config.effective_interval_ms(sys::configTICK_RATE_HZ);
        if effective_ms != config.sample_interval_ms {
            rt_warn!(
                PRODUCER_LOG,
                now_ms(),
                "tick rate {} Hz: sampling every {} ms instead of {} ms",
                sys::configTICK_RATE_HZ,
                effective_ms,
                config.sample_interval_ms
            );
        }

        let mut lines = SysLines::configure(&config.lines)?;
        let indicator = SysIndicator::configure(config.indicator_line)?;

        let mut producer = ProducerCore::new(
            &config,
            indicator,
            &BUFFER,
            &MAILBOX,
            &PRODUCER_LOG,
            now_ms(),
        );

        spawn_responder()?;

        loop {
            producer.cycle(&mut lines, now_ms());
            delay_ticks(cycle_ticks);
        }
    }

    fn spawn_responder() -> Result<(), EspError> {
        let mut handle: sys::TaskHandle_t = ptr::null_mut();

        // SAFETY: Static entry point and name; the task borrows only statics
        let created = unsafe {
            sys::xTaskCreatePinnedToCore(
                Some(responder_task),
                c"responder".as_ptr(),
                RESPONDER_STACK,
                ptr::null_mut(),
                RESPONDER_PRIORITY,
                &mut handle,
                RESPONDER_CORE,
            )
        };

        if created != PD_PASS {
            return Err(EspError::from_infallible::<{ sys::ESP_ERR_NO_MEM as i32 }>());
        }
        Ok(())
    }

    /// Responder restart entry point: fresh task, then retire the caller.
    fn restart_responder() {
        rt_warn!(RESPONDER_LOG, now_ms(), "responder restart");
        if spawn_responder().is_ok() {
            // SAFETY: Deletes the calling task; nothing runs after this
            unsafe { sys::vTaskDelete(ptr::null_mut()) };
        }
    }

    unsafe extern "C" fn responder_task(_: *mut c_void) {
        let binding = ResponderBinding::new(&BUFFER, restart_responder);
        let mut responder = MonitorResponder::bind(binding, &MAILBOX);
        rt_info!(RESPONDER_LOG, now_ms(), "responder up on core {}", RESPONDER_CORE);

        loop {
            responder.serve_transaction();
            if responder.transactions() % 1000 == 0 {
                rt_debug!(
                    RESPONDER_LOG,
                    now_ms(),
                    "transactions {} changes {}",
                    responder.transactions(),
                    responder.changes()
                );
            }
            delay_ms(TRANSACTION_PERIOD_MS);
        }
    }

    fn drain_task(mut uart: UartTxDriver<'static>) {
        let mut drain = LogDrain::new(DROP_REPORT_INTERVAL_MS, now_ms());
        loop {
            let written = drain.drain_into(&[&PRODUCER_LOG, &RESPONDER_LOG], now_ms(), |line| {
                let _ = uart.write(line);
            });
            if written == 0 {
                delay_ms(DRAIN_IDLE_MS);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod bench {
    use std::convert::Infallible;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use embedded_hal::digital::{ErrorType, OutputPin};

    use psx_pad_emulator::log_drain::DROP_REPORT_INTERVAL_MS;
    use psx_pad_emulator::{
        rt_info, Button, EmulatorConfig, LineMap, LineReader, LogDrain, LogStream,
        MonitorResponder, ProducerCore, ProtocolResponder, ResponderBinding, SharedStateBuffer,
        StatusMailbox,
    };

    const DEFAULT_DURATION_MS: u64 = 2_000;

    /// How long each simulated button stays pressed.
    const PRESS_MS: u32 = 120;

    const TRANSACTION_PERIOD: Duration = Duration::from_millis(16);

    static RESTARTS: AtomicU32 = AtomicU32::new(0);

    fn restart_responder() {
        RESTARTS.fetch_add(1, Ordering::Relaxed);
    }

    /// `pad [duration_ms]`
    pub fn duration_from_args() -> Duration {
        let ms = std::env::args()
            .nth(1)
            .and_then(|arg| arg.parse().ok())
            .unwrap_or(DEFAULT_DURATION_MS);
        Duration::from_millis(ms)
    }

    /// Presses one button at a time, walking through every slot.
    struct ScriptedLines {
        map: LineMap,
        now_ms: u32,
    }

    impl ScriptedLines {
        fn active(&self) -> Button {
            Button::ALL[(self.now_ms / PRESS_MS) as usize % Button::COUNT]
        }
    }

    impl LineReader for ScriptedLines {
        fn is_asserted(&mut self, line: u8) -> bool {
            self.map.line(self.active()) == Some(line)
        }
    }

    /// Indicator that only counts transitions.
    #[derive(Default)]
    struct CountingLed {
        toggles: u32,
        high: bool,
    }

    impl ErrorType for CountingLed {
        type Error = Infallible;
    }

    impl OutputPin for CountingLed {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            if self.high {
                self.toggles += 1;
            }
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            if !self.high {
                self.toggles += 1;
            }
            self.high = true;
            Ok(())
        }
    }

    pub fn run(duration: Duration) {
        let buffer = SharedStateBuffer::new();
        let mailbox = StatusMailbox::new();
        let producer_log = LogStream::new();
        let responder_log = LogStream::new();
        let stop = AtomicBool::new(false);

        let config = EmulatorConfig::default();
        let start = Instant::now();
        let now_ms = || start.elapsed().as_millis() as u32;

        rt_info!(producer_log, now_ms(), "{}", env!("VERSION_STRING"));
        if let Err(err) = config.validate() {
            eprintln!("config rejected: {}", err);
            return;
        }

        let mut stdout = std::io::stdout().lock();
        let mut drain = LogDrain::new(DROP_REPORT_INTERVAL_MS, now_ms());
        let mut lines = ScriptedLines {
            map: config.lines,
            now_ms: 0,
        };
        let mut producer = ProducerCore::new(
            &config,
            CountingLed::default(),
            &buffer,
            &mailbox,
            &producer_log,
            now_ms(),
        );

        let (transactions, changes) = thread::scope(|s| {
            let responder = s.spawn(|| {
                let binding = ResponderBinding::new(&buffer, restart_responder);
                let mut responder = MonitorResponder::bind(binding, &mailbox);
                rt_info!(responder_log, now_ms(), "responder up");
                while !stop.load(Ordering::Relaxed) {
                    responder.serve_transaction();
                    thread::sleep(TRANSACTION_PERIOD);
                }
                (responder.transactions(), responder.changes())
            });

            let interval = Duration::from_millis(u64::from(config.sample_interval_ms));
            while start.elapsed() < duration {
                let now = now_ms();
                lines.now_ms = now;
                producer.cycle(&mut lines, now);
                drain.drain_into(&[&producer_log, &responder_log], now_ms(), |line| {
                    let _ = stdout.write_all(line);
                });
                thread::sleep(interval);
            }

            stop.store(true, Ordering::Relaxed);
            responder.join().unwrap_or((0, 0))
        });

        drain.drain_into(&[&producer_log, &responder_log], now_ms(), |line| {
            let _ = stdout.write_all(line);
        });

        let diag = buffer.diagnostics();
        let _ = writeln!(
            stdout,
            "writes {} reads {} max retries {} transactions {} changes {} restarts {} indicator toggles {}",
            buffer.writes(),
            diag.reads,
            diag.max_retries,
            transactions,
            changes,
            RESTARTS.load(Ordering::Relaxed),
            producer.annunciator().indicator().toggles
        );
    }
}
