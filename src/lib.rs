//! Badge-tap attendance: the kiosk pipeline that reads an RFID reader over a
//! serial line, and the service that turns each scan into a clock-in or
//! clock-out record.

pub mod api;
pub mod attendance;
pub mod config;
pub mod db;
pub mod docs;
pub mod kiosk;
pub mod model;
pub mod routes;
pub mod telemetry;
