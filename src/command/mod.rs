mod checkin;
mod config;
mod connection;
mod tasks;

pub use checkin::{run_checkin, run_start};
pub use config::run_config;
pub use connection::{run_browse, run_test_connection};
pub use tasks::{run_branch, run_load, run_pending};
