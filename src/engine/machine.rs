//! Legal transitions of one day's attendance record.
//!
//! Each transition takes the current record by reference and returns the
//! next record, or the reason it is refused. Nothing here touches storage or
//! the task service; the caller persists the returned value.

use chrono::{NaiveDate, NaiveTime};

use crate::engine::duration::recomputed;
use crate::engine::error::AttendanceError;
use crate::engine::policy::Policy;
use crate::engine::status::{self, Classification};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, TimeOut};

/// The two mutually exclusive non-work sub-sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Break,
    Lunch,
}

impl Pause {
    pub fn bounds(self, record: &AttendanceRecord) -> (Option<NaiveTime>, Option<NaiveTime>) {
        match self {
            Pause::Break => (record.break_start, record.break_end),
            Pause::Lunch => (record.lunch_start, record.lunch_end),
        }
    }

    fn bounds_mut(
        self,
        record: &mut AttendanceRecord,
    ) -> (&mut Option<NaiveTime>, &mut Option<NaiveTime>) {
        match self {
            Pause::Break => (&mut record.break_start, &mut record.break_end),
            Pause::Lunch => (&mut record.lunch_start, &mut record.lunch_end),
        }
    }

    pub fn other(self) -> Self {
        match self {
            Pause::Break => Pause::Lunch,
            Pause::Lunch => Pause::Break,
        }
    }

    pub fn is_open(self, record: &AttendanceRecord) -> bool {
        matches!(self.bounds(record), (Some(_), None))
    }

    pub fn label(self) -> &'static str {
        match self {
            Pause::Break => "break",
            Pause::Lunch => "lunch",
        }
    }

    fn in_progress(self) -> AttendanceError {
        match self {
            Pause::Break => AttendanceError::BreakInProgress,
            Pause::Lunch => AttendanceError::LunchInProgress,
        }
    }

    fn not_started(self) -> AttendanceError {
        match self {
            Pause::Break => AttendanceError::BreakNotStarted,
            Pause::Lunch => AttendanceError::LunchNotStarted,
        }
    }

    fn already_ended(self) -> AttendanceError {
        match self {
            Pause::Break => AttendanceError::BreakAlreadyEnded,
            Pause::Lunch => AttendanceError::LunchAlreadyEnded,
        }
    }

    fn already_taken(self) -> AttendanceError {
        match self {
            Pause::Break => AttendanceError::BreakAlreadyTaken,
            Pause::Lunch => AttendanceError::LunchAlreadyTaken,
        }
    }
}

/// Punch-in for `date`. A record left behind by an early work start is
/// completed rather than duplicated.
pub fn punch_in(
    existing: Option<&AttendanceRecord>,
    emp_id: &str,
    date: NaiveDate,
    at: NaiveTime,
    policy: &Policy,
) -> Result<(AttendanceRecord, Classification), AttendanceError> {
    let record = match existing {
        Some(r) if r.time_in.is_some() || r.status == AttendanceStatus::Absent => {
            return Err(AttendanceError::AlreadyPunchedIn);
        }
        Some(r) => r.clone(),
        None => AttendanceRecord::new(emp_id, date),
    };

    let classification = status::classify_punch_in(policy, at);
    let record = AttendanceRecord {
        time_in: Some(at),
        status: classification.status,
        ..record
    };
    Ok((recomputed(record), classification))
}

/// Guards are checked in order: no punch-in, already out, open break, open
/// lunch, open work session. The running-task check belongs to the caller.
pub fn punch_out(
    record: Option<&AttendanceRecord>,
    at: NaiveTime,
    policy: &Policy,
) -> Result<AttendanceRecord, AttendanceError> {
    let record = record.ok_or(AttendanceError::NotPunchedIn)?;
    let time_in = record.time_in.ok_or(AttendanceError::NotPunchedIn)?;
    if record.is_punched_out() {
        return Err(AttendanceError::AlreadyPunchedOut);
    }
    if record.is_break_open() {
        return Err(AttendanceError::BreakInProgress);
    }
    if record.is_lunch_open() {
        return Err(AttendanceError::LunchInProgress);
    }
    if record.is_work_open() {
        return Err(AttendanceError::WorkInProgress);
    }

    let next = AttendanceRecord {
        time_out: Some(TimeOut::Recorded(at)),
        status: status::classify_punch_out(policy, time_in, at, record.status),
        ..record.clone()
    };
    Ok(recomputed(next))
}

pub fn start_work(
    existing: Option<&AttendanceRecord>,
    emp_id: &str,
    date: NaiveDate,
    at: NaiveTime,
) -> Result<AttendanceRecord, AttendanceError> {
    let record = match existing {
        Some(r) => r.clone(),
        None => AttendanceRecord::new(emp_id, date),
    };
    if record.is_punched_out() {
        return Err(AttendanceError::AlreadyPunchedOut);
    }
    match (record.work_start, record.work_end) {
        (Some(_), None) => return Err(AttendanceError::WorkAlreadyStarted),
        (Some(_), Some(_)) => return Err(AttendanceError::WorkAlreadyEnded),
        _ => {}
    }

    Ok(recomputed(AttendanceRecord {
        work_start: Some(at),
        ..record
    }))
}

pub fn end_work(
    record: Option<&AttendanceRecord>,
    at: NaiveTime,
) -> Result<AttendanceRecord, AttendanceError> {
    let record = record.ok_or(AttendanceError::WorkNotStarted)?;
    match (record.work_start, record.work_end) {
        (None, _) => Err(AttendanceError::WorkNotStarted),
        (Some(_), Some(_)) => Err(AttendanceError::WorkAlreadyEnded),
        (Some(_), None) => Ok(recomputed(AttendanceRecord {
            work_end: Some(at),
            ..record.clone()
        })),
    }
}

pub fn start_pause(
    record: Option<&AttendanceRecord>,
    pause: Pause,
    at: NaiveTime,
) -> Result<AttendanceRecord, AttendanceError> {
    let record = record
        .filter(|r| r.time_in.is_some())
        .ok_or(AttendanceError::NotPunchedIn)?;
    if record.is_punched_out() {
        return Err(AttendanceError::AlreadyPunchedOut);
    }
    if pause.is_open(record) {
        return Err(pause.in_progress());
    }
    if pause.other().is_open(record) {
        return Err(pause.other().in_progress());
    }
    if pause.bounds(record).1.is_some() {
        return Err(pause.already_taken());
    }

    let mut next = record.clone();
    let (start, _) = pause.bounds_mut(&mut next);
    *start = Some(at);
    Ok(recomputed(next))
}

pub fn end_pause(
    record: Option<&AttendanceRecord>,
    pause: Pause,
    at: NaiveTime,
) -> Result<AttendanceRecord, AttendanceError> {
    let record = record.ok_or(pause.not_started())?;
    match pause.bounds(record) {
        (None, _) => Err(pause.not_started()),
        (Some(_), Some(_)) => Err(pause.already_ended()),
        (Some(_), None) => {
            let mut next = record.clone();
            let (_, end) = pause.bounds_mut(&mut next);
            *end = Some(at);
            Ok(recomputed(next))
        }
    }
}

/// Flags an unclosed past day; the placeholder punch-out is not a real one.
pub fn mark_missed_punchout(record: &AttendanceRecord) -> AttendanceRecord {
    recomputed(AttendanceRecord {
        time_out: Some(TimeOut::Missed),
        missed_punchout: true,
        ..record.clone()
    })
}

/// Clears the missed punch-out flag using the employee's stated leave time.
pub fn resolve_missed_punchout(
    record: &AttendanceRecord,
    reason: &str,
    at: NaiveTime,
    policy: &Policy,
) -> Result<AttendanceRecord, AttendanceError> {
    if !record.missed_punchout {
        return Err(AttendanceError::NoPendingMissedPunchout);
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AttendanceError::InvalidRemark("reason is required".into()));
    }
    let time_in = record
        .time_in
        .ok_or_else(|| AttendanceError::InvalidRemark("record has no punch-in".into()))?;
    if at < time_in {
        return Err(AttendanceError::InvalidRemark(format!(
            "time {at} is before punch-in {time_in}"
        )));
    }

    Ok(recomputed(AttendanceRecord {
        time_out: Some(TimeOut::Recorded(at)),
        status: status::classify_punch_out(policy, time_in, at, record.status),
        missed_punchout: false,
        missed_reason: Some(reason.to_string()),
        missed_time: Some(at),
        ..record.clone()
    }))
}
