use chrono::NaiveTime;

use crate::engine::policy::Policy;
use crate::model::attendance::AttendanceStatus;

/// Outcome of classifying a punch-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: AttendanceStatus,
    /// e.g. "1 hr 5 min late", only for plain late arrivals
    pub late_by: Option<String>,
}

pub fn classify_punch_in(policy: &Policy, time_in: NaiveTime) -> Classification {
    if time_in > policy.half_day_cutoff {
        return Classification {
            status: AttendanceStatus::HalfDay,
            late_by: None,
        };
    }

    if time_in > policy.reporting_time {
        let minutes = (time_in - policy.reporting_time).num_minutes();
        return Classification {
            status: AttendanceStatus::Late,
            late_by: Some(format_late_by(minutes)),
        };
    }

    Classification {
        status: AttendanceStatus::Present,
        late_by: None,
    }
}

/// Leaving at or before the cutoff, or arriving at or after it, is a half day.
pub fn classify_punch_out(
    policy: &Policy,
    time_in: NaiveTime,
    time_out: NaiveTime,
    current: AttendanceStatus,
) -> AttendanceStatus {
    if time_out <= policy.half_day_cutoff || time_in >= policy.half_day_cutoff {
        AttendanceStatus::HalfDay
    } else {
        current
    }
}

/// Administrative edits: an explicit status wins, otherwise the punch rules
/// are replayed against the edited times.
pub fn classify_edit(
    policy: &Policy,
    time_in: Option<NaiveTime>,
    time_out: Option<NaiveTime>,
    explicit: Option<AttendanceStatus>,
) -> AttendanceStatus {
    if let Some(status) = explicit {
        return status;
    }

    let Some(time_in) = time_in else {
        return AttendanceStatus::Absent;
    };

    let status = classify_punch_in(policy, time_in).status;
    match time_out {
        Some(time_out) => classify_punch_out(policy, time_in, time_out, status),
        None => status,
    }
}

pub fn format_late_by(total_minutes: i64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours == 0 {
        format!("{} min late", minutes)
    } else if minutes == 0 {
        format!("{} hr late", hours)
    } else {
        format!("{} hr {} min late", hours, minutes)
    }
}
