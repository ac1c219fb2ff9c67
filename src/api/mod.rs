pub mod attendance;
pub mod scan;
pub mod users;
