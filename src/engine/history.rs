//! Gap-filled attendance history.
//!
//! Stored records are sparse: a day only has a row once someone punched,
//! started work, or a previous history read backfilled it. Reconciliation
//! walks every calendar day from the joining date to today and decides what
//! each missing day means, then the period narrows that sequence for the
//! aggregate counts.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::engine::clock::Clock;
use crate::engine::duration::{recomputed, serialize_hms};
use crate::engine::error::AttendanceError;
use crate::engine::service::AttendanceService;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Durations, Presence, TimeOut};
use crate::store::{AttendanceRepository, EmployeeDirectory, SettingsStore, TaskService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly { year: i32, month: u32 },
    Range { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Builds a period from the loose query parameters of the history routes.
    pub fn from_query(
        period: &str,
        year: Option<i32>,
        month: Option<u32>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, AttendanceError> {
        match period.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => match (year, month) {
                (Some(year), Some(month)) => Ok(Period::Yearly { year, month }),
                _ => Err(AttendanceError::Validation(
                    "yearly period requires year and month".into(),
                )),
            },
            "range" => match (start, end) {
                (Some(start), Some(end)) => Ok(Period::Range { start, end }),
                _ => Err(AttendanceError::Validation(
                    "range period requires start and end".into(),
                )),
            },
            other => Err(AttendanceError::InvalidPeriod(other.to_string())),
        }
    }
}

/// One calendar day of a reconciled history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<TimeOut>,
    pub status: AttendanceStatus,
    #[serde(rename = "isPresent")]
    pub is_present: Presence,
    #[serde(flatten)]
    pub durations: Durations,
}

impl DayEntry {
    fn from_record(record: &AttendanceRecord) -> Self {
        let record = recomputed(record.clone());
        Self {
            date: record.date,
            time_in: record.time_in,
            time_out: record.time_out,
            is_present: record.status.presence(),
            status: record.status,
            durations: record.durations,
        }
    }

    fn blank(date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            date,
            time_in: None,
            time_out: None,
            is_present: status.presence(),
            status,
            durations: Durations::default(),
        }
    }

    /// Sundays never count either way, whatever was stored.
    fn sunday(self) -> Self {
        Self {
            status: AttendanceStatus::NotSet,
            is_present: Presence::NotSet,
            ..self
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub records: Vec<DayEntry>,
    #[serde(serialize_with = "serialize_hms")]
    pub average_working_hours: Duration,
    pub total_present: usize,
    pub total_absent: usize,
    pub total_not_set: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HistoryReport {
    fn empty(message: String) -> Self {
        Self {
            records: Vec::new(),
            average_working_hours: Duration::zero(),
            total_present: 0,
            total_absent: 0,
            total_not_set: 0,
            start_date: None,
            end_date: None,
            message: Some(message),
        }
    }
}

/// Full day-by-day sequence plus the days that should be persisted as absent.
#[derive(Debug)]
pub struct Reconciled {
    pub entries: Vec<DayEntry>,
    pub backfill: Vec<NaiveDate>,
}

pub fn reconcile(joining: NaiveDate, today: NaiveDate, records: &[AttendanceRecord]) -> Reconciled {
    let by_date: HashMap<NaiveDate, &AttendanceRecord> =
        records.iter().map(|r| (r.date, r)).collect();
    let first_punch = records
        .iter()
        .filter(|r| r.time_in.is_some())
        .map(|r| r.date)
        .min();

    let mut entries = Vec::new();
    let mut backfill = Vec::new();
    for date in joining.iter_days().take_while(|d| *d <= today) {
        let sunday = date.weekday() == Weekday::Sun;
        let entry = match by_date.get(&date) {
            Some(record) => DayEntry::from_record(record),
            None if !sunday && date < today && first_punch.is_some_and(|f| date > f) => {
                backfill.push(date);
                DayEntry::blank(date, AttendanceStatus::Absent)
            }
            None => DayEntry::blank(date, AttendanceStatus::NotSet),
        };
        entries.push(if sunday { entry.sunday() } else { entry });
    }

    Reconciled { entries, backfill }
}

pub(crate) enum Window {
    Days(NaiveDate, NaiveDate),
    Empty(String),
}

pub(crate) fn window(
    period: Period,
    joining: NaiveDate,
    today: NaiveDate,
) -> Result<Window, AttendanceError> {
    let window = match period {
        Period::Daily => Window::Days(today, today),
        Period::Weekly => {
            let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            Window::Days(monday.max(joining), today)
        }
        Period::Monthly => {
            let first = today.with_day(1).unwrap_or(today);
            Window::Days(first.max(joining), today)
        }
        Period::Yearly { year, month } => {
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or(AttendanceError::InvalidMonth { year, month })?;
            if first > today {
                return Err(AttendanceError::FutureMonth { year, month, today });
            }
            let last = first
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .unwrap_or(first);
            if last < joining {
                Window::Empty(format!(
                    "No attendance for {year}-{month:02}, employee joined on {joining}"
                ))
            } else {
                Window::Days(first.max(joining), last.min(today))
            }
        }
        Period::Range { start, end } => {
            let (from, to) = (start.max(joining), end.min(today));
            if start > end || from > to {
                return Err(AttendanceError::InvalidRange {
                    start,
                    end,
                    joining_date: joining,
                    today,
                });
            }
            Window::Days(from, to)
        }
    };
    Ok(window)
}

/// Averages over the whole sequence, counts only inside `start..=end`.
pub fn aggregate(entries: Vec<DayEntry>, start: NaiveDate, end: NaiveDate) -> HistoryReport {
    let average_working_hours = if entries.is_empty() {
        Duration::zero()
    } else {
        let total: i64 = entries
            .iter()
            .map(|e| e.durations.working_hours.num_seconds())
            .sum();
        Duration::seconds(total / entries.len() as i64)
    };

    let records: Vec<DayEntry> = entries
        .into_iter()
        .filter(|e| e.date >= start && e.date <= end)
        .collect();
    let count = |presence: Presence| records.iter().filter(|e| e.is_present == presence).count();

    HistoryReport {
        total_present: count(Presence::Present),
        total_absent: count(Presence::Absent),
        total_not_set: count(Presence::NotSet),
        average_working_hours,
        start_date: Some(start),
        end_date: Some(end),
        message: None,
        records,
    }
}

impl<R, T, D, S, C> AttendanceService<R, T, D, S, C>
where
    R: AttendanceRepository,
    T: TaskService,
    D: EmployeeDirectory,
    S: SettingsStore,
    C: Clock,
{
    /// History of `emp_id` for `period`, persisting absent days on the way.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        emp_id: &str,
        period: Period,
    ) -> Result<HistoryReport, AttendanceError> {
        let employee = self.employee(emp_id).await?;
        let (joining, today) = (employee.joining_date, self.clock.today());
        if joining > today {
            return Ok(HistoryReport::empty(format!(
                "Employee joins on {joining}, no attendance yet"
            )));
        }

        let (start, end) = match window(period, joining, today)? {
            Window::Days(start, end) => (start, end),
            Window::Empty(message) => return Ok(HistoryReport::empty(message)),
        };

        let records = self.records.find_range(emp_id, joining, today).await?;
        let Reconciled {
            mut entries,
            backfill,
        } = reconcile(joining, today, &records);

        for date in &backfill {
            let stored = self.records.find_or_create_absent(emp_id, *date).await?;
            let index = (*date - joining).num_days() as usize;
            if let Some(entry) = entries.get_mut(index) {
                *entry = DayEntry::from_record(&stored);
            }
        }
        if !backfill.is_empty() {
            debug!(emp_id, days = backfill.len(), "Backfilled absent days");
        }

        Ok(aggregate(entries, start, end))
    }
}
