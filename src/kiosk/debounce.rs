use std::time::{Duration, Instant};

/// Drops repeat taps of the same badge inside a fixed window.
///
/// The window is anchored to the last *accepted* scan: rejected taps leave the
/// state alone, so a card held on the reader becomes eligible again exactly
/// one window after it was last accepted.
#[derive(Debug)]
pub struct ScanDebouncer {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl ScanDebouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns true if the scan should be forwarded.
    pub fn accept(&mut self, uid: &str, now: Instant) -> bool {
        if let Some((last_uid, last_at)) = &self.last {
            if last_uid == uid && now.saturating_duration_since(*last_at) < self.window {
                return false;
            }
        }

        self.last = Some((uid.to_string(), now));
        true
    }
}
