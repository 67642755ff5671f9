//! Attendance time-tracking engine.
//!
//! Pure pieces (`duration`, `status`, `machine`, `history::reconcile`) decide
//! what a day looks like; `AttendanceService` loads and persists records
//! around them through the collaborator traits in [`crate::store`].

pub mod clock;
pub mod dashboard;
pub mod duration;
pub mod error;
pub mod history;
pub mod machine;
pub mod policy;
pub mod recovery;
pub mod service;
pub mod status;
