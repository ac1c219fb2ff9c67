use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{MySql, MySqlPool, Transaction};
use thiserror::Error;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::scan_log::ScanLogEntry;
use crate::model::user::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Opens scan transactions. Dropping a transaction without `commit` discards
/// everything written through it.
#[allow(async_fn_in_trait)]
pub trait ScanStore {
    type Tx: ScanTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// The reads and writes one scan needs, all inside a single transaction.
#[allow(async_fn_in_trait)]
pub trait ScanTransaction {
    /// Looks up an active user and holds a lock on them until commit or
    /// rollback, so scans of the same badge run one at a time.
    async fn lock_active_user(&mut self, rfid_uid: &str) -> Result<Option<User>, StoreError>;

    /// Most recently created record for the user on `date`.
    async fn latest_record(
        &mut self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn insert_clock_in(
        &mut self,
        user_id: u64,
        date: NaiveDate,
        clock_in: NaiveDateTime,
    ) -> Result<u64, StoreError>;

    async fn close_record(
        &mut self,
        record_id: u64,
        clock_out: NaiveDateTime,
        work_duration: i32,
    ) -> Result<(), StoreError>;

    async fn append_scan_log(&mut self, entry: &ScanLogEntry) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}

/// MySQL-backed store used by the server.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

impl ScanStore for MySqlStore {
    type Tx = MySqlScanTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(MySqlScanTx { tx })
    }
}

pub struct MySqlScanTx {
    tx: Transaction<'static, MySql>,
}

impl ScanTransaction for MySqlScanTx {
    async fn lock_active_user(&mut self, rfid_uid: &str) -> Result<Option<User>, StoreError> {
        // Row lock on the user serializes the read-decide-write sequence per badge,
        // including the case where no attendance row exists yet.
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, rfid_uid, name, email, department, active
            FROM users
            WHERE rfid_uid = ? AND active = TRUE
            FOR UPDATE
            "#,
        )
        .bind(rfid_uid)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn latest_record(
        &mut self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, user_id, date, clock_in, clock_out, status, work_duration
            FROM attendance
            WHERE user_id = ? AND date = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record)
    }

    async fn insert_clock_in(
        &mut self,
        user_id: u64,
        date: NaiveDate,
        clock_in: NaiveDateTime,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, clock_in, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(clock_in)
        .bind(AttendanceStatus::ClockedIn.as_ref())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn close_record(
        &mut self,
        record_id: u64,
        clock_out: NaiveDateTime,
        work_duration: i32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET clock_out = ?, status = ?, work_duration = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(clock_out)
        .bind(AttendanceStatus::ClockedOut.as_ref())
        .bind(work_duration)
        .bind(record_id)
        .bind(AttendanceStatus::ClockedIn.as_ref())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        Ok(())
    }

    async fn append_scan_log(&mut self, entry: &ScanLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO scan_log (rfid_uid, action, success, message, scanned_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.rfid_uid)
        .bind(entry.action.as_ref())
        .bind(entry.success)
        .bind(&entry.message)
        .bind(entry.scanned_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
