use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info};

use super::debounce::ScanDebouncer;
use super::queue::{EventReceiver, event_queue};
use super::reader::{LinkOpener, ReaderSettings, SerialLineReader};
use crate::config::KioskConfig;

/// The running ingestion side of the kiosk: the reader thread, its stop flag
/// and the consumer end of the scan queue. Stopping clears the flag, joins the
/// reader and so releases the device.
pub struct Pipeline {
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    events: EventReceiver,
}

impl Pipeline {
    pub fn start<O: LinkOpener + 'static>(opener: O, config: &KioskConfig) -> io::Result<Self> {
        let settings = ReaderSettings {
            reconnect_delay: config.reconnect_delay,
            ..ReaderSettings::default()
        };
        Self::start_with(
            opener,
            config.debounce_window,
            config.queue_warn_depth,
            settings,
        )
    }

    pub fn start_with<O: LinkOpener + 'static>(
        opener: O,
        debounce_window: Duration,
        queue_warn_depth: usize,
        settings: ReaderSettings,
    ) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let (tx, events) = event_queue(queue_warn_depth);
        let reader = SerialLineReader::new(opener, ScanDebouncer::new(debounce_window), tx, settings);
        let handle = reader.spawn(running.clone())?;

        info!("Scan pipeline started");
        Ok(Self {
            running,
            reader: Some(handle),
            events,
        })
    }

    pub fn events(&mut self) -> &mut EventReceiver {
        &mut self.events
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                error!("Reader thread panicked");
            }
            info!("Scan pipeline stopped");
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
