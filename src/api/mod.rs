use crate::engine::clock::SystemClock;
use crate::engine::service::AttendanceService;
use crate::store::mysql::MySqlStore;

pub mod admin;
pub mod attendance;
pub mod settings;

/// The engine as wired in production: MySQL behind every collaborator.
pub type Service =
    AttendanceService<MySqlStore, MySqlStore, MySqlStore, MySqlStore, SystemClock>;
