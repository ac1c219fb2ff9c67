use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{error, info, warn};

use super::store::{ScanStore, ScanTransaction, StoreError};
use crate::model::attendance::{AttendanceRecord, minutes_between};
use crate::model::scan_log::{ScanAction, ScanLogEntry};
use crate::model::user::{User, normalize_uid};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("rfid_uid must not be empty")]
    EmptyUid,

    #[error("scan could not be persisted: {0}")]
    Persistence(#[from] StoreError),
}

/// Next step for a user given their latest record today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ClockIn,
    ClockOut { record_id: u64, work_duration: i32 },
}

/// Result of a committed scan.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Recorded {
        user: User,
        action: ScanAction,
        message: String,
        at: NaiveDateTime,
    },
    UnknownCard {
        rfid_uid: String,
    },
}

/// No record or a closed one opens a new span; an open one gets closed.
pub fn decide(latest: Option<&AttendanceRecord>, now: NaiveDateTime) -> Transition {
    match latest {
        Some(record) if record.is_open() => Transition::ClockOut {
            record_id: record.id,
            work_duration: minutes_between(record.clock_in, now),
        },
        _ => Transition::ClockIn,
    }
}

/// Clock-in/clock-out decisions for badge scans.
///
/// Each call runs in one store transaction: the user lookup (which locks the
/// user), the attendance mutation and the scan log entry commit together or
/// not at all.
pub struct AttendanceStateMachine<S> {
    store: S,
}

impl<S: ScanStore> AttendanceStateMachine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn process_scan(
        &self,
        raw_uid: &str,
        now: NaiveDateTime,
    ) -> Result<ScanOutcome, ScanError> {
        let rfid_uid = normalize_uid(raw_uid);
        if rfid_uid.is_empty() {
            return Err(ScanError::EmptyUid);
        }

        // Any early return drops the transaction, which rolls it back.
        let result = self.apply(&rfid_uid, now).await;
        if let Err(e) = &result {
            error!(error = %e, rfid_uid = %rfid_uid, "Scan transaction failed");
        }
        result
    }

    async fn apply(&self, rfid_uid: &str, now: NaiveDateTime) -> Result<ScanOutcome, ScanError> {
        let mut tx = self.store.begin().await?;

        let Some(user) = tx.lock_active_user(rfid_uid).await? else {
            tx.append_scan_log(&ScanLogEntry {
                rfid_uid: rfid_uid.to_string(),
                action: ScanAction::Unknown,
                success: false,
                message: "User not found".to_string(),
                scanned_at: now,
            })
            .await?;
            tx.commit().await?;

            warn!(rfid_uid, "Scan of unregistered card");
            return Ok(ScanOutcome::UnknownCard {
                rfid_uid: rfid_uid.to_string(),
            });
        };

        let today = now.date();
        let latest = tx.latest_record(user.id, today).await?;

        let (action, message) = match decide(latest.as_ref(), now) {
            Transition::ClockIn => {
                tx.insert_clock_in(user.id, today, now).await?;
                (
                    ScanAction::ClockIn,
                    format!("Welcome {}! Clocked in successfully.", user.name),
                )
            }
            Transition::ClockOut {
                record_id,
                work_duration,
            } => {
                tx.close_record(record_id, now, work_duration).await?;
                (
                    ScanAction::ClockOut,
                    format!("Goodbye {}! Clocked out successfully.", user.name),
                )
            }
        };

        tx.append_scan_log(&ScanLogEntry {
            rfid_uid: rfid_uid.to_string(),
            action,
            success: true,
            message: message.clone(),
            scanned_at: now,
        })
        .await?;
        tx.commit().await?;

        info!(rfid_uid, user_id = user.id, action = %action, "Scan recorded");
        Ok(ScanOutcome::Recorded {
            user,
            action,
            message,
            at: now,
        })
    }
}
