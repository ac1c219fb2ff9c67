pub mod machine;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use machine::{AttendanceStateMachine, ScanError, ScanOutcome};
pub use store::{MySqlStore, ScanStore, StoreError};
