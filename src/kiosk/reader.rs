use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serialport::SerialPort;
use tracing::{debug, error, info, warn};

use super::debounce::ScanDebouncer;
use super::line::{LineAssembler, parse_uid};
use super::queue::{EventSender, ScanEvent};

const MAX_READ: usize = 1024;

/// A connected reader device. Reads are polled, never blocking on an empty line.
pub trait SerialLink: Send {
    fn bytes_available(&mut self) -> io::Result<usize>;
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Knows how to (re)open the device.
pub trait LinkOpener: Send {
    type Link: SerialLink;

    fn open(&mut self) -> io::Result<Self::Link>;
    fn describe(&self) -> String;
}

/// Serial port at a fixed baud rate.
pub struct SerialPortOpener {
    path: String,
    baud_rate: u32,
}

impl SerialPortOpener {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

pub struct SerialDevice {
    port: Box<dyn SerialPort>,
}

impl SerialLink for SerialDevice {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl LinkOpener for SerialPortOpener {
    type Link = SerialDevice;

    fn open(&mut self) -> io::Result<SerialDevice> {
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;
        Ok(SerialDevice { port })
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.path, self.baud_rate)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReaderSettings {
    /// Wait after a failed open. Retries never stop and never back off.
    pub reconnect_delay: Duration,
    /// Sleep between polls.
    pub poll_interval: Duration,
    /// Pause after a read fault.
    pub error_pause: Duration,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            poll_interval: Duration::from_millis(10),
            error_pause: Duration::from_secs(1),
        }
    }
}

/// Owns the device handle and the debounce state; both live only on the
/// reader thread.
pub struct SerialLineReader<O: LinkOpener> {
    opener: O,
    link: Option<O::Link>,
    lines: LineAssembler,
    debouncer: ScanDebouncer,
    events: EventSender,
    settings: ReaderSettings,
}

impl<O: LinkOpener + 'static> SerialLineReader<O> {
    pub fn new(
        opener: O,
        debouncer: ScanDebouncer,
        events: EventSender,
        settings: ReaderSettings,
    ) -> Self {
        Self {
            opener,
            link: None,
            lines: LineAssembler::new(),
            debouncer,
            events,
            settings,
        }
    }

    pub fn spawn(self, running: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("rfid-reader".to_string())
            .spawn(move || self.run(&running))
    }

    /// Polls until `running` is cleared. Device faults are logged and retried
    /// here; nothing escapes this loop.
    pub fn run(mut self, running: &AtomicBool) {
        info!(device = %self.opener.describe(), "Reader started");

        while running.load(Ordering::Acquire) {
            if !self.ensure_connected() {
                pause(self.settings.reconnect_delay, running);
                continue;
            }

            if let Err(e) = self.poll_once(Instant::now()) {
                error!(error = %e, "Error in RFID reader, reconnecting");
                self.disconnect();
                pause(self.settings.error_pause, running);
                continue;
            }

            thread::sleep(self.settings.poll_interval);
        }

        self.disconnect();
        info!("Reader stopped");
    }

    fn ensure_connected(&mut self) -> bool {
        if self.link.is_some() {
            return true;
        }
        match self.opener.open() {
            Ok(link) => {
                info!(device = %self.opener.describe(), "Connected to reader");
                self.lines.reset();
                self.link = Some(link);
                true
            }
            Err(e) => {
                error!(device = %self.opener.describe(), error = %e, "Failed to connect to reader");
                false
            }
        }
    }

    fn disconnect(&mut self) {
        self.link = None;
        self.lines.reset();
    }

    /// Reads whatever is buffered and forwards accepted scans. Returns how many
    /// were queued.
    fn poll_once(&mut self, now: Instant) -> io::Result<usize> {
        let Some(link) = self.link.as_mut() else {
            return Ok(0);
        };

        let available = link.bytes_available()?;
        if available == 0 {
            return Ok(0);
        }

        let mut buf = vec![0u8; available.min(MAX_READ)];
        let n = match link.read_into(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => 0,
            Err(e) => return Err(e),
        };

        let mut queued = 0;
        for line in self.lines.push(&buf[..n]) {
            debug!(line = %line, "Reader line");

            let Some(uid) = parse_uid(&line) else {
                continue;
            };
            info!(uid = %uid, "Detected RFID");

            if !self.debouncer.accept(&uid, now) {
                debug!(uid = %uid, "Debounced duplicate scan");
                continue;
            }

            if self.events.push(ScanEvent {
                uid,
                arrived_at: now,
            }) {
                queued += 1;
            } else {
                warn!("Scan queue consumer is gone; dropping scan");
            }
        }
        Ok(queued)
    }
}

/// Sleeps for `total`, waking early if `running` is cleared.
fn pause(total: Duration, running: &AtomicBool) {
    let step = Duration::from_millis(50);
    let deadline = Instant::now() + total;
    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(step.min(deadline - now));
    }
}
