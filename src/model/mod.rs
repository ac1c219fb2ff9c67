pub mod attendance;
pub mod scan_log;
pub mod user;
