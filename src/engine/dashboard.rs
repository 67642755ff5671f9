//! Views across employees for HR and admins, and one employee's full log.
//!
//! Nothing here writes. The team report reconciles gaps the same way the
//! personal history does but leaves backfilling to that path.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::instrument;

use crate::engine::clock::Clock;
use crate::engine::duration::{recomputed, serialize_hms};
use crate::engine::error::AttendanceError;
use crate::engine::history::{Period, Window, reconcile, window};
use crate::engine::service::AttendanceService;
use crate::model::attendance::{AttendanceRecord, Presence};
use crate::model::employee::Employee;
use crate::store::{AttendanceRepository, EmployeeDirectory, SettingsStore, TaskService};

/// A stored record labelled with its employee's name.
#[derive(Debug, Serialize)]
pub struct NamedAttendance {
    /// `None` when the employee row is gone
    pub name: Option<String>,
    #[serde(flatten)]
    pub attendance: AttendanceRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub emp_id: String,
    pub total_days: usize,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReportRow {
    pub emp_id: String,
    pub name: String,
    pub present_count: usize,
    pub absent_count: usize,
    #[serde(serialize_with = "serialize_hms")]
    pub total_working_hours: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub report: Vec<TeamReportRow>,
}

impl<R, T, D, S, C> AttendanceService<R, T, D, S, C>
where
    R: AttendanceRepository,
    T: TaskService,
    D: EmployeeDirectory,
    S: SettingsStore,
    C: Clock,
{
    /// Every stored day of every employee, newest first.
    pub async fn all_attendance(&self) -> Result<Vec<NamedAttendance>, AttendanceError> {
        let names: HashMap<String, String> = self
            .directory
            .list_all()
            .await?
            .into_iter()
            .map(|e| (e.emp_id, e.name))
            .collect();

        let records = self.records.find_all().await?;
        Ok(records
            .into_iter()
            .map(|record| NamedAttendance {
                name: names.get(&record.emp_id).cloned(),
                attendance: recomputed(record),
            })
            .collect())
    }

    pub async fn dashboard(&self, emp_id: &str) -> Result<Dashboard, AttendanceError> {
        let employee = self.employee(emp_id).await?;
        let today = self.clock.today();

        let mut records: Vec<AttendanceRecord> = self
            .records
            .find_range(emp_id, employee.joining_date, today)
            .await?
            .into_iter()
            .map(recomputed)
            .collect();
        records.reverse();

        Ok(Dashboard {
            emp_id: employee.emp_id,
            total_days: records.len(),
            records,
        })
    }

    /// Presence counts and worked hours of every active employee over one
    /// company-wide window.
    #[instrument(skip(self))]
    pub async fn team_report(&self, period: Period) -> Result<TeamReport, AttendanceError> {
        let today = self.clock.today();
        let (start, end) = match window(period, NaiveDate::MIN, today)? {
            Window::Days(start, end) => (start, end),
            Window::Empty(message) => return Err(AttendanceError::Validation(message)),
        };

        let mut employees = self.directory.list_active().await?;
        employees.sort_by(|a, b| a.emp_id.cmp(&b.emp_id));

        let mut report = Vec::with_capacity(employees.len());
        for employee in employees {
            report.push(self.team_row(employee, start, end, today).await?);
        }

        Ok(TeamReport {
            start_date: start,
            end_date: end,
            report,
        })
    }

    async fn team_row(
        &self,
        employee: Employee,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> Result<TeamReportRow, AttendanceError> {
        let joining = employee.joining_date;
        let entries = if joining > end {
            Vec::new()
        } else {
            let records = self
                .records
                .find_range(&employee.emp_id, joining, today)
                .await?;
            reconcile(joining, today, &records).entries
        };

        let in_window: Vec<_> = entries
            .iter()
            .filter(|e| e.date >= start && e.date <= end)
            .collect();
        let count = |presence: Presence| in_window.iter().filter(|e| e.is_present == presence).count();
        let total_working_hours = in_window
            .iter()
            .fold(Duration::zero(), |total, e| total + e.durations.working_hours);

        Ok(TeamReportRow {
            present_count: count(Presence::Present),
            absent_count: count(Presence::Absent),
            total_working_hours,
            emp_id: employee.emp_id,
            name: employee.name,
        })
    }
}
