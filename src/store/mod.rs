//! Persistence and collaborator boundary of the attendance engine.
//!
//! The engine only talks to the outside world through these traits: the
//! record store, the todo service it consults before punch-out, the
//! employee directory it reads joining dates from, and the settings row
//! holding admin overrides.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::engine::policy::BreakLimits;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;

pub mod mysql;

#[cfg(test)]
pub mod memory;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A row for the same `(emp_id, date)` already exists
    #[error("Duplicate entry")]
    Duplicate,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Sole persistence boundary for attendance records.
#[allow(async_fn_in_trait)]
pub trait AttendanceRepository {
    async fn find(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// All records of an employee between `start` and `end` inclusive, ordered by date
    async fn find_range(
        &self,
        emp_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Every stored record, newest day first
    async fn find_all(&self) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the day already has a record
    async fn create(&self, record: &AttendanceRecord) -> Result<(), StoreError>;

    /// Inserts an absent record unless the day already has one, returning
    /// whichever record is stored. Safe to race.
    async fn find_or_create_absent(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError>;

    async fn update(&self, record: &AttendanceRecord) -> Result<(), StoreError>;

    /// Punched-in days before `date` that were never punched out and are not yet flagged
    async fn find_unclosed_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Most recent record still flagged as a missed punch-out
    async fn find_pending_missed(
        &self,
        emp_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;
}

/// The todo service, seen only through the signals attendance needs.
#[allow(async_fn_in_trait)]
pub trait TaskService {
    async fn has_running_task(&self, emp_id: &str) -> Result<bool, StoreError>;

    /// Whether the employee has any task that is not completed
    async fn has_assignable_tasks(&self, emp_id: &str) -> Result<bool, StoreError>;

    /// Pauses running tasks at `at`, banking their tracked time
    async fn pause_running_tasks(&self, emp_id: &str, at: NaiveTime) -> Result<(), StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait EmployeeDirectory {
    async fn find_employee(&self, emp_id: &str) -> Result<Option<Employee>, StoreError>;

    async fn list_active(&self) -> Result<Vec<Employee>, StoreError>;

    /// Active or not, for labelling historical records
    async fn list_all(&self) -> Result<Vec<Employee>, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// `None` until an admin has saved limits
    async fn break_limits(&self) -> Result<Option<BreakLimits>, StoreError>;

    async fn save_break_limits(&self, limits: BreakLimits) -> Result<(), StoreError>;
}
