use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// What a scan did. `Unknown` is logged for badges with no active user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanAction {
    ClockIn,
    ClockOut,
    Unknown,
}

/// Append-only audit row, one per scan attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogEntry {
    pub rfid_uid: String,
    pub action: ScanAction,
    pub success: bool,
    pub message: String,
    pub scanned_at: NaiveDateTime,
}
