//! In-memory `ScanStore` for tests. A transaction works on a staged copy of
//! the state and holds the store lock until it commits or is dropped.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::store::{ScanStore, ScanTransaction, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::scan_log::ScanLogEntry;
use crate::model::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertClockIn,
    CloseRecord,
    AppendScanLog,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    records: Vec<AttendanceRecord>,
    logs: Vec<ScanLogEntry>,
    next_record_id: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<AsyncMutex<MemoryState>>,
    fail: Arc<Mutex<Option<FailPoint>>>,
}

impl MemoryStore {
    pub fn add_user(&self, rfid_uid: &str, name: &str, department: Option<&str>, active: bool) {
        let mut state = self.state.try_lock().expect("store busy");
        let id = state.users.len() as u64 + 1;
        state.users.push(User {
            id,
            rfid_uid: rfid_uid.to_string(),
            name: name.to_string(),
            email: None,
            department: department.map(str::to_string),
            active,
        });
    }

    pub fn fail_at(&self, point: Option<FailPoint>) {
        *self.fail.lock().expect("fail point poisoned") = point;
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.state.try_lock().expect("store busy").records.clone()
    }

    pub fn scan_logs(&self) -> Vec<ScanLogEntry> {
        self.state.try_lock().expect("store busy").logs.clone()
    }
}

impl ScanStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        let fail = *self.fail.lock().expect("fail point poisoned");
        Ok(MemoryTx {
            guard,
            staged,
            fail,
        })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    fail: Option<FailPoint>,
}

impl MemoryTx {
    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.fail == Some(point) {
            return Err(StoreError::Unavailable(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

impl ScanTransaction for MemoryTx {
    async fn lock_active_user(&mut self, rfid_uid: &str) -> Result<Option<User>, StoreError> {
        // Let other tasks run while the lock is held.
        tokio::task::yield_now().await;
        Ok(self
            .staged
            .users
            .iter()
            .find(|u| u.rfid_uid == rfid_uid && u.active)
            .cloned())
    }

    async fn latest_record(
        &mut self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .staged
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.date == date)
            .max_by_key(|r| r.id)
            .cloned())
    }

    async fn insert_clock_in(
        &mut self,
        user_id: u64,
        date: NaiveDate,
        clock_in: NaiveDateTime,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::InsertClockIn)?;
        self.staged.next_record_id += 1;
        let id = self.staged.next_record_id;
        self.staged.records.push(AttendanceRecord {
            id,
            user_id,
            date,
            clock_in,
            clock_out: None,
            status: AttendanceStatus::ClockedIn,
            work_duration: None,
        });
        Ok(id)
    }

    async fn close_record(
        &mut self,
        record_id: u64,
        clock_out: NaiveDateTime,
        work_duration: i32,
    ) -> Result<(), StoreError> {
        self.check(FailPoint::CloseRecord)?;
        let record = self
            .staged
            .records
            .iter_mut()
            .find(|r| r.id == record_id && r.is_open())
            .ok_or_else(|| StoreError::Unavailable(format!("no open record {record_id}")))?;
        record.clock_out = Some(clock_out);
        record.status = AttendanceStatus::ClockedOut;
        record.work_duration = Some(work_duration);
        Ok(())
    }

    async fn append_scan_log(&mut self, entry: &ScanLogEntry) -> Result<(), StoreError> {
        self.check(FailPoint::AppendScanLog)?;
        self.staged.logs.push(entry.clone());
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        self.check(FailPoint::Commit)?;
        *self.guard = self.staged;
        Ok(())
    }
}
