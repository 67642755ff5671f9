use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use futures_util::StreamExt;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::{FromRow, MySql, MySqlPool};
use tracing::debug;

use crate::engine::duration::{format_hms, recomputed};
use crate::engine::policy::BreakLimits;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, TimeOut};
use crate::model::employee::Employee;
use crate::store::{
    AttendanceRepository, EmployeeDirectory, SettingsStore, StoreError, TaskService,
};

const COLUMNS: &str = "emp_id, date, time_in, time_out, work_start, work_end, \
    break_start, break_end, lunch_start, lunch_end, status, \
    missed_punchout, missed_reason, missed_time, key_learning";

/// Attendance, todo, employee and settings tables behind one pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AttendanceRow {
    emp_id: String,
    date: NaiveDate,
    time_in: Option<NaiveTime>,
    time_out: Option<NaiveTime>,
    work_start: Option<NaiveTime>,
    work_end: Option<NaiveTime>,
    break_start: Option<NaiveTime>,
    break_end: Option<NaiveTime>,
    lunch_start: Option<NaiveTime>,
    lunch_end: Option<NaiveTime>,
    status: String,
    missed_punchout: bool,
    missed_reason: Option<String>,
    missed_time: Option<NaiveTime>,
    key_learning: Option<String>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| {
            StoreError::Corrupt(format!(
                "unknown status '{}' for {} on {}",
                row.status, row.emp_id, row.date
            ))
        })?;

        // a flagged day keeps time_out NULL until the remark supplies one
        let time_out = match (row.time_out, row.missed_punchout) {
            (Some(t), _) => Some(TimeOut::Recorded(t)),
            (None, true) => Some(TimeOut::Missed),
            (None, false) => None,
        };

        Ok(recomputed(AttendanceRecord {
            time_in: row.time_in,
            time_out,
            work_start: row.work_start,
            work_end: row.work_end,
            break_start: row.break_start,
            break_end: row.break_end,
            lunch_start: row.lunch_start,
            lunch_end: row.lunch_end,
            status,
            missed_punchout: row.missed_punchout,
            missed_reason: row.missed_reason,
            missed_time: row.missed_time,
            key_learning: row.key_learning,
            ..AttendanceRecord::new(row.emp_id, row.date)
        }))
    }
}

fn map_db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return StoreError::Duplicate;
        }
    }
    StoreError::Database(e)
}

/// Binds every mutable column in the order used by INSERT and UPDATE below.
fn bind_fields<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    record: &'q AttendanceRecord,
) -> Query<'q, MySql, MySqlArguments> {
    let durations = &record.durations;
    query
        .bind(record.time_in)
        .bind(record.time_out.and_then(|t| t.recorded()))
        .bind(record.work_start)
        .bind(record.work_end)
        .bind(record.break_start)
        .bind(record.break_end)
        .bind(record.lunch_start)
        .bind(record.lunch_end)
        .bind(record.status.as_str())
        .bind(record.missed_punchout)
        .bind(record.missed_reason.as_deref())
        .bind(record.missed_time)
        .bind(record.key_learning.as_deref())
        .bind(format_hms(durations.working_hours))
        .bind(format_hms(durations.office_hours))
        .bind(format_hms(durations.work_duration))
        .bind(format_hms(durations.break_duration))
        .bind(format_hms(durations.lunch_duration))
}

impl AttendanceRepository for MySqlStore {
    async fn find(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM attendance WHERE emp_id = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(emp_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn find_range(
        &self,
        emp_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attendance \
             WHERE emp_id = ? AND date BETWEEN ? AND ? ORDER BY date"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(emp_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM attendance WHERE date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }

    async fn find_all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM attendance ORDER BY date DESC, emp_id");
        let mut stream = sqlx::query_as::<_, AttendanceRow>(&sql).fetch(&self.pool);

        let mut records = Vec::new();
        while let Some(row) = stream.next().await {
            records.push(AttendanceRecord::try_from(row?)?);
        }
        Ok(records)
    }

    async fn create(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let query = sqlx::query(
            r#"
            INSERT INTO attendance
            (emp_id, date, time_in, time_out, work_start, work_end,
             break_start, break_end, lunch_start, lunch_end, status,
             missed_punchout, missed_reason, missed_time, key_learning,
             working_hours, office_hours, work_duration, break_duration, lunch_duration)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.emp_id.as_str())
        .bind(record.date);

        bind_fields(query, record)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_or_create_absent(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError> {
        // the unique (emp_id, date) key turns a lost race into a no-op
        let inserted = sqlx::query(
            r#"
            INSERT IGNORE INTO attendance (emp_id, date, status, missed_punchout)
            VALUES (?, ?, 'absent', 0)
            "#,
        )
        .bind(emp_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            debug!(emp_id, %date, "Absent day backfilled");
        }

        self.find(emp_id, date).await?.ok_or_else(|| {
            StoreError::Corrupt(format!("attendance for {emp_id} on {date} vanished"))
        })
    }

    async fn update(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let query = sqlx::query(
            r#"
            UPDATE attendance
            SET time_in = ?, time_out = ?, work_start = ?, work_end = ?,
                break_start = ?, break_end = ?, lunch_start = ?, lunch_end = ?,
                status = ?, missed_punchout = ?, missed_reason = ?, missed_time = ?,
                key_learning = ?, working_hours = ?, office_hours = ?,
                work_duration = ?, break_duration = ?, lunch_duration = ?
            WHERE emp_id = ? AND date = ?
            "#,
        );

        bind_fields(query, record)
            .bind(record.emp_id.as_str())
            .bind(record.date)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_unclosed_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attendance \
             WHERE date < ? AND time_in IS NOT NULL AND time_out IS NULL \
             AND missed_punchout = 0 ORDER BY date"
        );
        let mut stream = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(date)
            .fetch(&self.pool);

        let mut unclosed = Vec::new();
        while let Some(row) = stream.next().await {
            unclosed.push(AttendanceRecord::try_from(row?)?);
        }
        Ok(unclosed)
    }

    async fn find_pending_missed(
        &self,
        emp_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attendance \
             WHERE emp_id = ? AND missed_punchout = 1 ORDER BY date DESC LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(emp_id)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }
}

impl TaskService for MySqlStore {
    async fn has_running_task(&self, emp_id: &str) -> Result<bool, StoreError> {
        let running: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM todos WHERE emp_id = ? AND status = 'started')",
        )
        .bind(emp_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(running != 0)
    }

    async fn has_assignable_tasks(&self, emp_id: &str) -> Result<bool, StoreError> {
        let open: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM todos WHERE emp_id = ? AND status <> 'completed')",
        )
        .bind(emp_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(open != 0)
    }

    async fn pause_running_tasks(&self, emp_id: &str, at: NaiveTime) -> Result<(), StoreError> {
        let paused = sqlx::query(
            r#"
            UPDATE todos
            SET status = 'paused',
                total_tracked_time = SEC_TO_TIME(
                    TIME_TO_SEC(COALESCE(total_tracked_time, '00:00:00'))
                    + GREATEST(TIME_TO_SEC(?) - TIME_TO_SEC(TIME(start_time)), 0)
                ),
                start_time = NULL
            WHERE emp_id = ? AND status = 'started'
            "#,
        )
        .bind(at)
        .bind(emp_id)
        .execute(&self.pool)
        .await?;

        if paused.rows_affected() > 0 {
            debug!(emp_id, tasks = paused.rows_affected(), "Paused running tasks");
        }
        Ok(())
    }
}

impl EmployeeDirectory for MySqlStore {
    async fn find_employee(&self, emp_id: &str) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT emp_id, name, joining_date, status FROM employees WHERE emp_id = ?",
        )
        .bind(emp_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn list_active(&self) -> Result<Vec<Employee>, StoreError> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT emp_id, name, joining_date, status FROM employees WHERE status = 'active'",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    async fn list_all(&self) -> Result<Vec<Employee>, StoreError> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT emp_id, name, joining_date, status FROM employees",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }
}

/// The settings table holds a single row with id 1.
impl SettingsStore for MySqlStore {
    async fn break_limits(&self) -> Result<Option<BreakLimits>, StoreError> {
        let row: Option<(u32, u32)> = sqlx::query_as(
            "SELECT break_minutes, lunch_minutes FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(break_minutes, lunch_minutes)| BreakLimits {
            break_minutes,
            lunch_minutes,
        }))
    }

    async fn save_break_limits(&self, limits: BreakLimits) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, break_minutes, lunch_minutes)
            VALUES (1, ?, ?)
            ON DUPLICATE KEY UPDATE
                break_minutes = VALUES(break_minutes),
                lunch_minutes = VALUES(lunch_minutes)
            "#,
        )
        .bind(limits.break_minutes)
        .bind(limits.lunch_minutes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::duration::format_hms;

    fn row(time_out: Option<NaiveTime>, missed: bool, status: &str) -> AttendanceRow {
        AttendanceRow {
            emp_id: "EMP001".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            time_in: NaiveTime::from_hms_opt(9, 0, 0),
            time_out,
            work_start: None,
            work_end: None,
            break_start: NaiveTime::from_hms_opt(11, 0, 0),
            break_end: NaiveTime::from_hms_opt(11, 15, 0),
            lunch_start: None,
            lunch_end: None,
            status: status.into(),
            missed_punchout: missed,
            missed_reason: None,
            missed_time: None,
            key_learning: None,
        }
    }

    #[test]
    fn row_durations_are_rebuilt() {
        let record =
            AttendanceRecord::try_from(row(NaiveTime::from_hms_opt(18, 0, 0), false, "late"))
                .unwrap();
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(format_hms(record.durations.working_hours), "08:45:00");
    }

    #[test]
    fn flagged_row_reads_back_as_missed() {
        let record = AttendanceRecord::try_from(row(None, true, "present")).unwrap();
        assert_eq!(record.time_out, Some(TimeOut::Missed));
        assert_eq!(format_hms(record.durations.office_hours), "00:00:00");
    }

    #[test]
    fn unknown_status_is_corrupt() {
        let err = AttendanceRecord::try_from(row(None, false, "on leave")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn status_column_is_case_insensitive() {
        let record = AttendanceRecord::try_from(row(None, false, "Half-Day")).unwrap();
        assert_eq!(record.status, AttendanceStatus::HalfDay);
    }
}
