//! Derived durations of an attendance day.
//!
//! Everything here is pure: figures are rebuilt from the raw punch fields and
//! the record's own date, never from the wall clock or previously cached
//! values.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serializer;

use crate::model::attendance::{AttendanceRecord, Durations};

/// Length of `start..end` on `date`, zero when an endpoint is missing or the
/// interval is inverted.
pub fn span(date: NaiveDate, start: Option<NaiveTime>, end: Option<NaiveTime>) -> Duration {
    match (start, end) {
        (Some(start), Some(end)) => {
            let elapsed = date.and_time(end) - date.and_time(start);
            elapsed.max(Duration::zero())
        }
        _ => Duration::zero(),
    }
}

pub fn compute_durations(record: &AttendanceRecord) -> Durations {
    let date = record.date;
    let time_out = record.time_out.and_then(|t| t.recorded());

    let office_hours = span(date, record.time_in, time_out);
    let work_duration = span(date, record.work_start, record.work_end);
    let break_duration = span(date, record.break_start, record.break_end);
    let lunch_duration = span(date, record.lunch_start, record.lunch_end);

    // the focused work session wins over the punch bracket when it is complete
    let gross = if record.work_start.is_some() && record.work_end.is_some() {
        work_duration
    } else {
        office_hours
    };
    let working_hours = (gross - break_duration - lunch_duration).max(Duration::zero());

    Durations {
        working_hours,
        office_hours,
        work_duration,
        break_duration,
        lunch_duration,
    }
}

/// Returns `record` with its cached durations rebuilt.
pub fn recomputed(mut record: AttendanceRecord) -> AttendanceRecord {
    record.durations = compute_durations(&record);
    record
}

/// `HH:MM:SS`, hours are not wrapped at 24
pub fn format_hms(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

pub fn serialize_hms<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_hms(*duration))
}
