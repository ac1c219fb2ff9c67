//! Kiosk side: serial reader → debouncer → scan queue → UI driver, which
//! dispatches each accepted scan to the attendance service and shows the
//! result.

pub mod debounce;
pub mod dispatch;
pub mod driver;
pub mod line;
pub mod pipeline;
pub mod presentation;
pub mod queue;
pub mod reader;
pub mod render;

pub use dispatch::{DispatchError, DispatchOutcome, ScanDispatcher};
pub use driver::UiDriver;
pub use pipeline::Pipeline;
pub use reader::SerialPortOpener;
