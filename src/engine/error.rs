use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use strum::IntoStaticStr;
use thiserror::Error;

use crate::store::StoreError;

/// Every outcome the attendance engine can refuse with.
///
/// State conflicts are expected results of the current record state, not
/// faults; none of them should be retried.
#[derive(Error, Debug, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceError {
    // state conflicts
    #[error("Already punched in today")]
    AlreadyPunchedIn,

    #[error("You have not punched in today")]
    NotPunchedIn,

    #[error("Already punched out today")]
    AlreadyPunchedOut,

    #[error("A break is in progress")]
    BreakInProgress,

    #[error("Lunch is in progress")]
    LunchInProgress,

    #[error("A work session is in progress")]
    WorkInProgress,

    #[error("A task is still running")]
    TaskInProgress,

    #[error("No tasks assigned, add a task before starting work")]
    NoTasksAssigned,

    #[error("Work has already been started today")]
    WorkAlreadyStarted,

    #[error("Work has not been started")]
    WorkNotStarted,

    #[error("Work has already been ended today")]
    WorkAlreadyEnded,

    #[error("Break has not been started")]
    BreakNotStarted,

    #[error("Break has already been ended")]
    BreakAlreadyEnded,

    #[error("Break has already been taken today")]
    BreakAlreadyTaken,

    #[error("Lunch has not been started")]
    LunchNotStarted,

    #[error("Lunch has already been ended")]
    LunchAlreadyEnded,

    #[error("Lunch has already been taken today")]
    LunchAlreadyTaken,

    #[error("Punch-in closed after {cutoff}, you are marked absent today")]
    PunchInClosed { cutoff: NaiveTime },

    #[error("Attendance for {emp_id} already exists on {date}")]
    AttendanceExists { emp_id: String, date: NaiveDate },

    // recovery gate
    #[error("Missed punch-out on {date} needs a reason and time before continuing")]
    PendingMissedPunchoutRemark { date: NaiveDate },

    #[error("No missed punch-out is pending")]
    NoPendingMissedPunchout,

    // policy input
    #[error("Invalid period '{0}', allowed: daily, weekly, monthly, yearly, range")]
    InvalidPeriod(String),

    #[error("Invalid month {year}-{month}, month must be 1-12")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Requested month {year}-{month:02} is after today ({today})")]
    FutureMonth { year: i32, month: u32, today: NaiveDate },

    #[error("Invalid range {start}..{end}, allowed {joining_date}..{today}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        joining_date: NaiveDate,
        today: NaiveDate,
    },

    #[error("Cannot record attendance before joining date ({joining_date})")]
    BeforeJoiningDate { joining_date: NaiveDate },

    #[error("Invalid missed punch-out remark: {0}")]
    InvalidRemark(String),

    #[error("{0}")]
    Validation(String),

    // lookups
    #[error("Employee {0} not found")]
    EmployeeNotFound(String),

    #[error("Employee {0} is not active")]
    EmployeeInactive(String),

    #[error("Attendance record not found for {emp_id} on {date}")]
    RecordNotFound { emp_id: String, date: NaiveDate },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AttendanceError {
    /// Machine-readable kind, e.g. `ALREADY_PUNCHED_IN`
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        use AttendanceError::*;
        match self {
            PendingMissedPunchoutRemark { .. } => StatusCode::LOCKED,
            InvalidPeriod(_)
            | InvalidMonth { .. }
            | FutureMonth { .. }
            | InvalidRange { .. }
            | BeforeJoiningDate { .. }
            | InvalidRemark(_)
            | Validation(_) => StatusCode::BAD_REQUEST,
            EmployeeNotFound(_) | RecordNotFound { .. } => StatusCode::NOT_FOUND,
            EmployeeInactive(_) => StatusCode::FORBIDDEN,
            Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::Store(e) => {
                tracing::error!(error = %e, "Attendance store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "message": message,
            "success": false
        }))
    }
}
