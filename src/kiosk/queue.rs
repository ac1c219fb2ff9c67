use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Instant;

use tracing::warn;

/// An accepted badge tap on its way to the dispatcher. Not `Clone`: each one
/// is consumed exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct ScanEvent {
    pub uid: String,
    pub arrived_at: Instant,
}

/// Producer half, owned by the reader thread.
#[derive(Debug)]
pub struct EventSender {
    tx: Sender<ScanEvent>,
    depth: Arc<AtomicUsize>,
    warn_depth: usize,
}

/// Consumer half, owned by the UI driver.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<ScanEvent>,
    depth: Arc<AtomicUsize>,
}

/// Unbounded FIFO from the reader to the UI driver.
///
/// There is no cap. Depth is tracked and a warning is logged each time it
/// reaches a multiple of `warn_depth` so a stalled consumer shows up in logs.
pub fn event_queue(warn_depth: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        EventSender {
            tx,
            depth: depth.clone(),
            warn_depth,
        },
        EventReceiver { rx, depth },
    )
}

impl EventSender {
    /// Enqueues the event. Returns false once the consumer is gone.
    pub fn push(&self, event: ScanEvent) -> bool {
        // Counted before sending so a fast consumer never sees it go negative.
        let depth = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        if self.tx.send(event).is_err() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        if self.warn_depth > 0 && depth % self.warn_depth == 0 {
            warn!(depth, "Scan queue is backing up");
        }
        true
    }
}

impl EventReceiver {
    /// Takes everything queued right now, oldest first.
    pub fn drain(&mut self) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if !events.is_empty() {
            self.depth.fetch_sub(events.len(), Ordering::AcqRel);
        }
        events
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }
}
