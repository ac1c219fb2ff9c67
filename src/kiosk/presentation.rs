use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};

use super::dispatch::DispatchOutcome;
use super::queue::ScanEvent;
use crate::model::scan_log::ScanAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Waiting,
    Scanning {
        uid: String,
    },
    Success {
        action: ScanAction,
        name: String,
        department: Option<String>,
        time: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Waiting,
    Scanning,
    Success,
    Error,
}

/// Text content of the kiosk screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub tone: Tone,
    pub headline: String,
    pub user_line: String,
    pub detail: String,
}

/// Kiosk display states: waiting → scanning → success | error → waiting.
///
/// Results stay up for `hold`, then the next `tick` at or past the revert
/// deadline returns to waiting. A new scan always switches to scanning at
/// once, whatever is showing.
#[derive(Debug)]
pub struct PresentationStateMachine {
    state: DisplayState,
    revert_at: Option<Instant>,
    hold: Duration,
}

impl PresentationStateMachine {
    pub fn new(hold: Duration) -> Self {
        Self {
            state: DisplayState::Waiting,
            revert_at: None,
            hold,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn revert_at(&self) -> Option<Instant> {
        self.revert_at
    }

    pub fn on_scan(&mut self, event: &ScanEvent) {
        self.state = DisplayState::Scanning {
            uid: event.uid.clone(),
        };
        self.revert_at = None;
    }

    pub fn on_outcome(&mut self, outcome: DispatchOutcome, now: Instant) {
        self.state = match outcome.result {
            Ok(scan) => DisplayState::Success {
                action: scan.action,
                name: scan.name,
                department: scan.department,
                time: display_time(&scan.timestamp)
                    .unwrap_or_else(|| Local::now().format("%H:%M:%S").to_string()),
            },
            Err(e) => DisplayState::Error {
                message: error_text(&e.to_string()),
            },
        };
        self.revert_at = Some(now + self.hold);
    }

    /// Returns true if the state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.revert_at {
            Some(deadline) if now >= deadline => {
                self.state = DisplayState::Waiting;
                self.revert_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn screen(&self) -> Screen {
        match &self.state {
            DisplayState::Waiting => Screen {
                tone: Tone::Waiting,
                headline: "Waiting for RFID card...".to_string(),
                user_line: String::new(),
                detail: "Place your card on the reader".to_string(),
            },
            DisplayState::Scanning { uid } => Screen {
                tone: Tone::Scanning,
                headline: "Card Detected".to_string(),
                user_line: format!("UID: {uid}"),
                detail: "Processing...".to_string(),
            },
            DisplayState::Success {
                action,
                name,
                department,
                time,
            } => {
                let (headline, detail) = match action {
                    ScanAction::ClockIn => ("✓ CLOCKED IN", format!("Welcome! Started at {time}")),
                    _ => ("✓ CLOCKED OUT", format!("Goodbye! Ended at {time}")),
                };
                Screen {
                    tone: Tone::Success,
                    headline: headline.to_string(),
                    user_line: format!("{name}\n{}", department.as_deref().unwrap_or_default()),
                    detail,
                }
            }
            DisplayState::Error { message } => Screen {
                tone: Tone::Error,
                headline: "✗ ERROR".to_string(),
                user_line: message.clone(),
                detail: "Please try again or contact support".to_string(),
            },
        }
    }
}

/// HH:MM:SS from the service timestamp, if it parses.
fn display_time(timestamp: &str) -> Option<String> {
    timestamp
        .parse::<NaiveDateTime>()
        .ok()
        .map(|t| t.format("%H:%M:%S").to_string())
}

fn error_text(message: &str) -> String {
    if message.to_lowercase().contains("not registered") {
        "Card Not Registered\nPlease contact administrator".to_string()
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kiosk::dispatch::{AcceptedScan, DispatchError};

    const HOLD: Duration = Duration::from_secs(3);

    fn scan(uid: &str) -> ScanEvent {
        ScanEvent {
            uid: uid.to_string(),
            arrived_at: Instant::now(),
        }
    }

    fn accepted(action: ScanAction, timestamp: &str) -> DispatchOutcome {
        DispatchOutcome {
            uid: "04A1B2C3".to_string(),
            result: Ok(AcceptedScan {
                action,
                name: "Jane Doe".to_string(),
                department: Some("Engineering".to_string()),
                message: String::new(),
                timestamp: timestamp.to_string(),
            }),
        }
    }

    fn failed(error: DispatchError) -> DispatchOutcome {
        DispatchOutcome {
            uid: "04A1B2C3".to_string(),
            result: Err(error),
        }
    }

    #[test]
    fn starts_waiting() {
        let ui = PresentationStateMachine::new(HOLD);
        assert_eq!(ui.state(), &DisplayState::Waiting);
        assert_eq!(ui.screen().headline, "Waiting for RFID card...");
    }

    #[test]
    fn scan_shows_scanning_before_result() {
        let mut ui = PresentationStateMachine::new(HOLD);
        ui.on_scan(&scan("04A1B2C3"));

        let screen = ui.screen();
        assert_eq!(screen.tone, Tone::Scanning);
        assert_eq!(screen.user_line, "UID: 04A1B2C3");
        assert_eq!(ui.revert_at(), None);
    }

    #[test]
    fn success_shows_user_and_server_time() {
        let mut ui = PresentationStateMachine::new(HOLD);
        let t0 = Instant::now();
        ui.on_scan(&scan("04A1B2C3"));
        ui.on_outcome(accepted(ScanAction::ClockIn, "2026-03-02T09:00:07"), t0);

        let screen = ui.screen();
        assert_eq!(screen.tone, Tone::Success);
        assert_eq!(screen.headline, "✓ CLOCKED IN");
        assert_eq!(screen.user_line, "Jane Doe\nEngineering");
        assert_eq!(screen.detail, "Welcome! Started at 09:00:07");
    }

    #[test]
    fn clock_out_has_its_own_wording() {
        let mut ui = PresentationStateMachine::new(HOLD);
        ui.on_outcome(accepted(ScanAction::ClockOut, "2026-03-02T17:00:00.250"), Instant::now());

        let screen = ui.screen();
        assert_eq!(screen.headline, "✓ CLOCKED OUT");
        assert_eq!(screen.detail, "Goodbye! Ended at 17:00:00");
    }

    #[test]
    fn unparsable_timestamp_falls_back_to_local_clock() {
        let mut ui = PresentationStateMachine::new(HOLD);
        ui.on_outcome(accepted(ScanAction::ClockIn, "yesterday"), Instant::now());

        match ui.state() {
            DisplayState::Success { time, .. } => assert_eq!(time.len(), 8),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn error_reverts_exactly_after_hold() {
        let mut ui = PresentationStateMachine::new(HOLD);
        let t0 = Instant::now();
        ui.on_scan(&scan("04A1B2C3"));
        ui.on_outcome(failed(DispatchError::Connection("refused".to_string())), t0);

        assert_eq!(ui.screen().user_line, "Connection failed: refused");
        assert!(!ui.tick(t0 + HOLD - Duration::from_millis(1)));
        assert_eq!(ui.screen().tone, Tone::Error);

        assert!(ui.tick(t0 + HOLD));
        assert_eq!(ui.state(), &DisplayState::Waiting);
        assert!(!ui.tick(t0 + HOLD * 2));
    }

    #[test]
    fn not_registered_gets_operator_wording() {
        let mut ui = PresentationStateMachine::new(HOLD);
        ui.on_outcome(failed(DispatchError::NotRegistered), Instant::now());

        let screen = ui.screen();
        assert_eq!(screen.headline, "✗ ERROR");
        assert_eq!(screen.user_line, "Card Not Registered\nPlease contact administrator");
    }

    #[test]
    fn new_scan_interrupts_result_and_cancels_revert() {
        let mut ui = PresentationStateMachine::new(HOLD);
        let t0 = Instant::now();
        ui.on_outcome(failed(DispatchError::Timeout), t0);
        ui.on_scan(&scan("DEADBEEF"));

        assert_eq!(
            ui.state(),
            &DisplayState::Scanning {
                uid: "DEADBEEF".to_string()
            }
        );
        assert!(!ui.tick(t0 + HOLD));
        assert_eq!(ui.screen().tone, Tone::Scanning);
    }
}
