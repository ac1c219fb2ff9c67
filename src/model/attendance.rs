use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    ClockedIn,
    ClockedOut,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One clock-in/clock-out span. Opened on clock-in, closed in place on clock-out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub clock_in: NaiveDateTime,
    pub clock_out: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    /// Whole minutes between clock_in and clock_out
    pub work_duration: Option<i32>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.status == AttendanceStatus::ClockedIn
    }
}

/// Whole minutes elapsed between two instants, rounded down.
pub fn minutes_between(start: NaiveDateTime, end: NaiveDateTime) -> i32 {
    let minutes = (end - start).num_minutes().max(0);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}
