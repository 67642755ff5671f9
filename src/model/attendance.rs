use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::engine::duration::serialize_hms;

/// Day status as stored in the `attendance.status` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
    ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[serde(rename = "present")]
    #[strum(serialize = "present")]
    Present,
    #[serde(rename = "late")]
    #[strum(serialize = "late")]
    Late,
    #[serde(rename = "half-day")]
    #[strum(serialize = "half-day")]
    HalfDay,
    #[serde(rename = "absent")]
    #[strum(serialize = "absent")]
    Absent,
    #[serde(rename = "not set")]
    #[strum(serialize = "not set")]
    NotSet,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// present, late and half-day all count as attended days
    pub fn presence(&self) -> Presence {
        match self {
            AttendanceStatus::Present | AttendanceStatus::Late | AttendanceStatus::HalfDay => {
                Presence::Present
            }
            AttendanceStatus::NotSet => Presence::NotSet,
            AttendanceStatus::Absent => Presence::Absent,
        }
    }
}

/// Three-way presence flag reported per history day.
///
/// Serialized the way clients already consume it: `true`, `false` or `"not set"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
    NotSet,
}

impl Serialize for Presence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Presence::Present => serializer.serialize_bool(true),
            Presence::Absent => serializer.serialize_bool(false),
            Presence::NotSet => serializer.serialize_str("not set"),
        }
    }
}

/// Primary punch-out of a day.
///
/// `Missed` is the placeholder left by the missed punch-out sweep. It is never
/// a real punch and contributes nothing to durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOut {
    Recorded(NaiveTime),
    Missed,
}

impl TimeOut {
    pub fn recorded(&self) -> Option<NaiveTime> {
        match self {
            TimeOut::Recorded(t) => Some(*t),
            TimeOut::Missed => None,
        }
    }
}

impl Serialize for TimeOut {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TimeOut::Recorded(t) => t.serialize(serializer),
            TimeOut::Missed => serializer.serialize_str("missed"),
        }
    }
}

/// Derived figures of one attendance day, all non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Durations {
    #[serde(serialize_with = "serialize_hms")]
    pub working_hours: Duration,
    #[serde(serialize_with = "serialize_hms")]
    pub office_hours: Duration,
    #[serde(serialize_with = "serialize_hms")]
    pub work_duration: Duration,
    #[serde(serialize_with = "serialize_hms")]
    pub break_duration: Duration,
    #[serde(serialize_with = "serialize_hms")]
    pub lunch_duration: Duration,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            working_hours: Duration::zero(),
            office_hours: Duration::zero(),
            work_duration: Duration::zero(),
            break_duration: Duration::zero(),
            lunch_duration: Duration::zero(),
        }
    }
}

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    pub emp_id: String,
    pub date: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<TimeOut>,
    pub work_start: Option<NaiveTime>,
    pub work_end: Option<NaiveTime>,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
    pub status: AttendanceStatus,
    #[serde(flatten)]
    pub durations: Durations,
    pub missed_punchout: bool,
    pub missed_reason: Option<String>,
    pub missed_time: Option<NaiveTime>,
    pub key_learning: Option<String>,
}

impl AttendanceRecord {
    /// Empty record for a day nobody has punched yet. Only a punch-in or an
    /// explicit status gives it a presence.
    pub fn new(emp_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            emp_id: emp_id.into(),
            date,
            time_in: None,
            time_out: None,
            work_start: None,
            work_end: None,
            break_start: None,
            break_end: None,
            lunch_start: None,
            lunch_end: None,
            status: AttendanceStatus::NotSet,
            durations: Durations::default(),
            missed_punchout: false,
            missed_reason: None,
            missed_time: None,
            key_learning: None,
        }
    }

    pub fn absent(emp_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            status: AttendanceStatus::Absent,
            ..Self::new(emp_id, date)
        }
    }

    pub fn is_punched_out(&self) -> bool {
        self.time_out.is_some()
    }

    pub fn is_work_open(&self) -> bool {
        self.work_start.is_some() && self.work_end.is_none()
    }

    pub fn is_break_open(&self) -> bool {
        self.break_start.is_some() && self.break_end.is_none()
    }

    pub fn is_lunch_open(&self) -> bool {
        self.lunch_start.is_some() && self.lunch_end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_column_text() {
        assert_eq!(AttendanceStatus::HalfDay.as_str(), "half-day");
        assert_eq!(AttendanceStatus::NotSet.to_string(), "not set");
        assert_eq!(
            AttendanceStatus::from_str("half-day").unwrap(),
            AttendanceStatus::HalfDay
        );
        // legacy rows were written as "Late"
        assert_eq!(AttendanceStatus::from_str("Late").unwrap(), AttendanceStatus::Late);
        assert!(AttendanceStatus::from_str("holiday").is_err());
    }

    #[test]
    fn presence_serializes_as_bool_or_not_set() {
        assert_eq!(serde_json::to_value(Presence::Present).unwrap(), serde_json::json!(true));
        assert_eq!(serde_json::to_value(Presence::Absent).unwrap(), serde_json::json!(false));
        assert_eq!(
            serde_json::to_value(Presence::NotSet).unwrap(),
            serde_json::json!("not set")
        );
    }

    #[test]
    fn presence_follows_status() {
        assert_eq!(AttendanceStatus::Late.presence(), Presence::Present);
        assert_eq!(AttendanceStatus::HalfDay.presence(), Presence::Present);
        assert_eq!(AttendanceStatus::Absent.presence(), Presence::Absent);
        assert_eq!(AttendanceStatus::NotSet.presence(), Presence::NotSet);
    }

    #[test]
    fn record_serializes_flat_durations_and_missed_marker() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        let mut record = AttendanceRecord::new("EMP001", date);
        record.time_in = NaiveTime::from_hms_opt(9, 0, 0);
        record.time_out = Some(TimeOut::Missed);
        record.missed_punchout = true;

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["time_in"], "09:00:00");
        assert_eq!(json["time_out"], "missed");
        assert_eq!(json["working_hours"], "00:00:00");
        assert_eq!(json["status"], "present");
    }
}
