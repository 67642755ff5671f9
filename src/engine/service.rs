use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::engine::clock::Clock;
use crate::engine::duration::{recomputed, serialize_hms};
use crate::engine::error::AttendanceError;
use crate::engine::machine::{self, Pause};
use crate::engine::policy::{BreakLimits, Policy};
use crate::engine::status;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Presence, TimeOut};
use crate::model::employee::Employee;
use crate::store::{
    AttendanceRepository, EmployeeDirectory, SettingsStore, StoreError, TaskService,
};

const KEY_LEARNING_MAX_CHARS: usize = 2000;
/// Upper bound for an admin-set break or lunch limit, one working day
const MAX_LIMIT_MINUTES: u32 = 480;

#[derive(Debug, Serialize)]
pub struct PunchInOutcome {
    pub attendance: AttendanceRecord,
    pub late_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PauseOutcome {
    pub attendance: AttendanceRecord,
    pub kind: &'static str,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_hms")]
    pub duration: Duration,
    pub limit_minutes: u32,
    pub over_limit: bool,
}

#[derive(Debug, Serialize)]
pub struct TodayStatus {
    pub date: NaiveDate,
    pub punched_in: bool,
    pub punched_out: bool,
    pub working: bool,
    pub on_break: bool,
    pub at_lunch: bool,
    pub attendance: AttendanceRecord,
    pub limits: BreakLimits,
    /// Date of a missed punch-out still waiting for a remark
    pub pending_missed_punchout: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct KeyLearning {
    pub date: NaiveDate,
    pub key_learning: Option<String>,
}

/// Administrative correction of a stored day. Absent fields keep their value.
#[derive(Debug, Default)]
pub struct AttendanceEdit {
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub status: Option<AttendanceStatus>,
}

#[derive(Debug)]
pub struct NewAttendance {
    pub date: NaiveDate,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub date: NaiveDate,
    pub total_employees: usize,
    pub present_today: usize,
    pub absent_today: usize,
}

/// Attendance engine bound to its collaborators.
pub struct AttendanceService<R, T, D, S, C> {
    pub(crate) records: R,
    pub(crate) tasks: T,
    pub(crate) directory: D,
    pub(crate) settings: S,
    pub(crate) clock: C,
    pub(crate) policy: Policy,
}

impl<R, T, D, S, C> AttendanceService<R, T, D, S, C>
where
    R: AttendanceRepository,
    T: TaskService,
    D: EmployeeDirectory,
    S: SettingsStore,
    C: Clock,
{
    pub fn new(records: R, tasks: T, directory: D, settings: S, clock: C, policy: Policy) -> Self {
        Self {
            records,
            tasks,
            directory,
            settings,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) async fn employee(&self, emp_id: &str) -> Result<Employee, AttendanceError> {
        self.directory
            .find_employee(emp_id)
            .await?
            .ok_or_else(|| AttendanceError::EmployeeNotFound(emp_id.to_string()))
    }

    /// Employee allowed to mutate attendance: known, active and not blocked
    /// on a missed punch-out.
    pub(crate) async fn ready_employee(&self, emp_id: &str) -> Result<Employee, AttendanceError> {
        let employee = self.employee(emp_id).await?;
        if !employee.is_active() {
            return Err(AttendanceError::EmployeeInactive(emp_id.to_string()));
        }
        self.ensure_no_pending_missed_punchout(emp_id).await?;
        Ok(employee)
    }

    /// Writes `record`, inserting when the day had no row yet. A lost insert
    /// race surfaces as `on_duplicate`.
    async fn persist(
        &self,
        existed: bool,
        record: &AttendanceRecord,
        on_duplicate: AttendanceError,
    ) -> Result<(), AttendanceError> {
        if existed {
            self.records.update(record).await?;
            return Ok(());
        }
        match self.records.create(record).await {
            Ok(()) => Ok(()),
            Err(StoreError::Duplicate) => Err(on_duplicate),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn punch_in(&self, emp_id: &str) -> Result<PunchInOutcome, AttendanceError> {
        self.ready_employee(emp_id).await?;
        let now = self.clock.now();
        let (today, at) = (now.date(), now.time());

        let existing = self.records.find(emp_id, today).await?;
        let (record, classification) =
            machine::punch_in(existing.as_ref(), emp_id, today, at, &self.policy)?;

        // a day already opened by a work session is left as it is
        if let Some(cutoff) = self.policy.absent_cutoff.filter(|cutoff| at > *cutoff) {
            if existing.is_none() {
                match self.records.create(&AttendanceRecord::absent(emp_id, today)).await {
                    Ok(()) => {
                        info!(emp_id, %at, %cutoff, "Punch-in after absent cutoff, marked absent")
                    }
                    Err(StoreError::Duplicate) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            return Err(AttendanceError::PunchInClosed { cutoff });
        }

        self.persist(existing.is_some(), &record, AttendanceError::AlreadyPunchedIn)
            .await?;
        info!(emp_id, %at, status = %record.status, "Punch-in recorded");

        Ok(PunchInOutcome {
            attendance: record,
            late_by: classification.late_by,
        })
    }

    #[instrument(skip(self))]
    pub async fn punch_out(&self, emp_id: &str) -> Result<AttendanceRecord, AttendanceError> {
        self.ready_employee(emp_id).await?;
        let now = self.clock.now();

        let existing = self.records.find(emp_id, now.date()).await?;
        let closed = machine::punch_out(existing.as_ref(), now.time(), &self.policy)?;
        if self.tasks.has_running_task(emp_id).await? {
            return Err(AttendanceError::TaskInProgress);
        }

        self.records.update(&closed).await?;
        info!(emp_id, status = %closed.status, "Punch-out recorded");
        Ok(closed)
    }

    #[instrument(skip(self))]
    pub async fn start_work(&self, emp_id: &str) -> Result<AttendanceRecord, AttendanceError> {
        self.ready_employee(emp_id).await?;
        if !self.tasks.has_assignable_tasks(emp_id).await? {
            return Err(AttendanceError::NoTasksAssigned);
        }
        let now = self.clock.now();

        let existing = self.records.find(emp_id, now.date()).await?;
        let record = machine::start_work(existing.as_ref(), emp_id, now.date(), now.time())?;
        self.persist(existing.is_some(), &record, AttendanceError::WorkAlreadyStarted)
            .await?;
        debug!(emp_id, "Work session started");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn end_work(&self, emp_id: &str) -> Result<AttendanceRecord, AttendanceError> {
        self.ready_employee(emp_id).await?;
        let now = self.clock.now();

        let existing = self.records.find(emp_id, now.date()).await?;
        let record = machine::end_work(existing.as_ref(), now.time())?;
        if self.tasks.has_running_task(emp_id).await? {
            return Err(AttendanceError::TaskInProgress);
        }

        self.records.update(&record).await?;
        debug!(emp_id, "Work session ended");
        Ok(record)
    }

    /// Starting a break or lunch pauses whatever task is running. The pause
    /// is recorded first; a failure to pause tasks afterwards is logged and
    /// does not undo it.
    #[instrument(skip(self))]
    pub async fn start_pause(
        &self,
        emp_id: &str,
        pause: Pause,
    ) -> Result<PauseOutcome, AttendanceError> {
        self.ready_employee(emp_id).await?;
        let now = self.clock.now();

        let existing = self.records.find(emp_id, now.date()).await?;
        let record = machine::start_pause(existing.as_ref(), pause, now.time())?;
        self.records.update(&record).await?;
        if let Err(e) = self.tasks.pause_running_tasks(emp_id, now.time()).await {
            error!(
                emp_id,
                kind = pause.label(),
                error = %e,
                "Pause recorded but running tasks could not be paused"
            );
        }
        debug!(emp_id, kind = pause.label(), "Pause started");

        let limits = self.break_limits().await?;
        Ok(Self::pause_outcome(record, pause, limits))
    }

    #[instrument(skip(self))]
    pub async fn end_pause(
        &self,
        emp_id: &str,
        pause: Pause,
    ) -> Result<PauseOutcome, AttendanceError> {
        self.ready_employee(emp_id).await?;
        let now = self.clock.now();

        let existing = self.records.find(emp_id, now.date()).await?;
        let record = machine::end_pause(existing.as_ref(), pause, now.time())?;
        self.records.update(&record).await?;

        let limits = self.break_limits().await?;
        let outcome = Self::pause_outcome(record, pause, limits);
        if outcome.over_limit {
            info!(emp_id, kind = pause.label(), "Pause exceeded configured limit");
        }
        Ok(outcome)
    }

    fn pause_outcome(
        attendance: AttendanceRecord,
        pause: Pause,
        limits: BreakLimits,
    ) -> PauseOutcome {
        let (start, end) = pause.bounds(&attendance);
        let duration = match pause {
            Pause::Break => attendance.durations.break_duration,
            Pause::Lunch => attendance.durations.lunch_duration,
        };
        let limit_minutes = limits.minutes(pause);
        PauseOutcome {
            kind: pause.label(),
            start,
            end,
            duration,
            limit_minutes,
            over_limit: duration > Duration::minutes(i64::from(limit_minutes)),
            attendance,
        }
    }

    pub async fn today_status(&self, emp_id: &str) -> Result<TodayStatus, AttendanceError> {
        self.employee(emp_id).await?;
        let today = self.clock.today();

        let attendance = match self.records.find(emp_id, today).await? {
            Some(record) => recomputed(record),
            None => AttendanceRecord::new(emp_id, today),
        };
        let pending = self.records.find_pending_missed(emp_id).await?;

        Ok(TodayStatus {
            date: today,
            punched_in: attendance.time_in.is_some(),
            punched_out: attendance.is_punched_out(),
            working: attendance.is_work_open(),
            on_break: attendance.is_break_open(),
            at_lunch: attendance.is_lunch_open(),
            attendance,
            limits: self.break_limits().await?,
            pending_missed_punchout: pending.map(|r| r.date),
        })
    }

    /// Stored admin override, else the configured defaults.
    pub async fn break_limits(&self) -> Result<BreakLimits, AttendanceError> {
        Ok(self
            .settings
            .break_limits()
            .await?
            .unwrap_or_else(|| self.policy.limits()))
    }

    #[instrument(skip(self))]
    pub async fn set_break_limits(
        &self,
        limits: BreakLimits,
    ) -> Result<BreakLimits, AttendanceError> {
        for (name, minutes) in [("break", limits.break_minutes), ("lunch", limits.lunch_minutes)] {
            if !(1..=MAX_LIMIT_MINUTES).contains(&minutes) {
                return Err(AttendanceError::Validation(format!(
                    "{name} limit must be between 1 and {MAX_LIMIT_MINUTES} minutes"
                )));
            }
        }
        self.settings.save_break_limits(limits).await?;
        info!(
            break_minutes = limits.break_minutes,
            lunch_minutes = limits.lunch_minutes,
            "Break limits updated"
        );
        Ok(limits)
    }

    #[instrument(skip(self, text))]
    pub async fn update_key_learning(
        &self,
        emp_id: &str,
        text: &str,
    ) -> Result<KeyLearning, AttendanceError> {
        self.ready_employee(emp_id).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AttendanceError::Validation("key_learning must not be empty".into()));
        }
        if text.chars().count() > KEY_LEARNING_MAX_CHARS {
            return Err(AttendanceError::Validation(format!(
                "key_learning must be at most {KEY_LEARNING_MAX_CHARS} characters"
            )));
        }

        let today = self.clock.today();
        let record = self
            .records
            .find(emp_id, today)
            .await?
            .filter(|r| r.time_in.is_some())
            .ok_or(AttendanceError::NotPunchedIn)?;
        let record = AttendanceRecord {
            key_learning: Some(text.to_string()),
            ..record
        };
        self.records.update(&record).await?;

        Ok(KeyLearning {
            date: today,
            key_learning: record.key_learning,
        })
    }

    pub async fn key_learning(&self, emp_id: &str) -> Result<KeyLearning, AttendanceError> {
        self.employee(emp_id).await?;
        let today = self.clock.today();
        let record = self.records.find(emp_id, today).await?;
        Ok(KeyLearning {
            date: today,
            key_learning: record.and_then(|r| r.key_learning),
        })
    }

    pub async fn record_for(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.employee(emp_id).await?;
        self.records
            .find(emp_id, date)
            .await?
            .map(recomputed)
            .ok_or_else(|| AttendanceError::RecordNotFound {
                emp_id: emp_id.to_string(),
                date,
            })
    }

    #[instrument(skip(self))]
    pub async fn edit_record(
        &self,
        emp_id: &str,
        date: NaiveDate,
        edit: AttendanceEdit,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let record = self.record_for(emp_id, date).await?;

        let time_in = edit.time_in.or(record.time_in);
        let (time_out, missed_punchout) = match edit.time_out {
            Some(t) => (Some(TimeOut::Recorded(t)), false),
            None => (record.time_out, record.missed_punchout),
        };
        let status = status::classify_edit(
            &self.policy,
            time_in,
            time_out.and_then(|t| t.recorded()),
            edit.status,
        );

        let edited = recomputed(AttendanceRecord {
            time_in,
            time_out,
            status,
            missed_punchout,
            ..record
        });
        self.records.update(&edited).await?;
        info!(emp_id, %date, status = %edited.status, "Attendance edited");
        Ok(edited)
    }

    #[instrument(skip(self))]
    pub async fn add_record(
        &self,
        emp_id: &str,
        new: NewAttendance,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let employee = self.employee(emp_id).await?;
        if new.date < employee.joining_date {
            return Err(AttendanceError::BeforeJoiningDate {
                joining_date: employee.joining_date,
            });
        }
        let today = self.clock.today();
        if new.date > today {
            return Err(AttendanceError::Validation(format!(
                "date {} is after today ({today})",
                new.date
            )));
        }

        let record = recomputed(AttendanceRecord {
            time_in: new.time_in,
            time_out: new.time_out.map(TimeOut::Recorded),
            status: new.status,
            ..AttendanceRecord::new(emp_id, new.date)
        });
        match self.records.create(&record).await {
            Ok(()) => {}
            Err(StoreError::Duplicate) => {
                return Err(AttendanceError::AttendanceExists {
                    emp_id: emp_id.to_string(),
                    date: new.date,
                });
            }
            Err(e) => return Err(e.into()),
        }
        info!(emp_id, date = %new.date, "Attendance added by admin");
        Ok(record)
    }

    pub async fn overview(&self) -> Result<AdminOverview, AttendanceError> {
        let today = self.clock.today();
        let employees = self.directory.list_active().await?;
        let records = self.records.find_by_date(today).await?;

        let presence_of = |emp_id: &str| {
            records
                .iter()
                .find(|r| r.emp_id == emp_id)
                .map(|r| r.status.presence())
        };
        let present_today = employees
            .iter()
            .filter(|e| presence_of(&e.emp_id) == Some(Presence::Present))
            .count();
        let absent_today = employees
            .iter()
            .filter(|e| presence_of(&e.emp_id) == Some(Presence::Absent))
            .count();

        Ok(AdminOverview {
            date: today,
            total_employees: employees.len(),
            present_today,
            absent_today,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::clock::FixedClock;
    use crate::engine::duration::format_hms;
    use crate::store::memory::MemoryStore;

    pub type TestService =
        AttendanceService<MemoryStore, MemoryStore, MemoryStore, MemoryStore, FixedClock>;

    pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub fn service_at(date: NaiveDate, h: u32, m: u32) -> (TestService, MemoryStore) {
        service_with(date, h, m, Policy::default())
    }

    pub fn service_with(
        date: NaiveDate,
        h: u32,
        m: u32,
        policy: Policy,
    ) -> (TestService, MemoryStore) {
        let store = MemoryStore::new();
        store.add_employee("EMP001", d(2025, 1, 10));
        let service = AttendanceService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            FixedClock::at(date, h, m),
            policy,
        );
        (service, store)
    }

    #[actix_web::test]
    async fn late_punch_in_reports_late_by() {
        let (service, _) = service_at(d(2025, 1, 14), 9, 45);
        let outcome = service.punch_in("EMP001").await.unwrap();
        assert_eq!(outcome.attendance.status, AttendanceStatus::Late);
        assert_eq!(outcome.late_by.as_deref(), Some("15 min late"));
    }

    #[actix_web::test]
    async fn punch_in_after_half_day_cutoff_is_half_day() {
        let (service, _) = service_at(d(2025, 1, 14), 14, 5);
        let outcome = service.punch_in("EMP001").await.unwrap();
        assert_eq!(outcome.attendance.status, AttendanceStatus::HalfDay);
        assert_eq!(outcome.late_by, None);
    }

    #[actix_web::test]
    async fn second_punch_in_is_rejected() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        service.punch_in("EMP001").await.unwrap();
        let err = service.punch_in("EMP001").await.unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyPunchedIn));
        assert_eq!(store.creates(), 1);
    }

    #[actix_web::test]
    async fn concurrent_punch_ins_create_one_row() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        let results =
            futures::future::join_all((0..4).map(|_| service.punch_in("EMP001"))).await;
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, AttendanceError::AlreadyPunchedIn))
        );
        assert_eq!(store.creates(), 1);
        // every loser read an empty day and was stopped by the unique key
        assert_eq!(store.lost_races(), 3);
    }

    #[actix_web::test]
    async fn absent_cutoff_closes_punch_in() {
        let policy = Policy {
            absent_cutoff: Some(t(19, 0)),
            ..Policy::default()
        };
        let (service, store) = service_with(d(2025, 1, 14), 19, 30, policy);
        let err = service.punch_in("EMP001").await.unwrap_err();
        assert!(matches!(err, AttendanceError::PunchInClosed { .. }));
        let stored = store.get("EMP001", d(2025, 1, 14)).unwrap();
        assert_eq!(stored.status, AttendanceStatus::Absent);

        let again = service.punch_in("EMP001").await.unwrap_err();
        assert!(matches!(again, AttendanceError::AlreadyPunchedIn));
    }

    #[actix_web::test]
    async fn absent_cutoff_leaves_work_session_day_alone() {
        let policy = Policy {
            absent_cutoff: Some(t(19, 0)),
            ..Policy::default()
        };
        let (service, store) = service_with(d(2025, 1, 14), 9, 0, policy);
        store.assign_task("EMP001");
        service.start_work("EMP001").await.unwrap();
        let before = store.get("EMP001", d(2025, 1, 14)).unwrap();

        service.clock.set(d(2025, 1, 14), 19, 30);
        let err = service.punch_in("EMP001").await.unwrap_err();
        assert!(matches!(err, AttendanceError::PunchInClosed { .. }));
        let after = store.get("EMP001", d(2025, 1, 14)).unwrap();
        assert_eq!(after, before);
        assert_eq!(after.status, AttendanceStatus::NotSet);
    }

    #[actix_web::test]
    async fn rejected_punch_out_leaves_record_unchanged() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        service.punch_in("EMP001").await.unwrap();
        store.assign_task("EMP001");
        service.start_pause("EMP001", Pause::Break).await.unwrap();
        let before = store.get("EMP001", d(2025, 1, 14)).unwrap();

        service.clock.set(d(2025, 1, 14), 18, 0);
        let err = service.punch_out("EMP001").await.unwrap_err();
        assert!(matches!(err, AttendanceError::BreakInProgress));
        assert_eq!(store.get("EMP001", d(2025, 1, 14)).unwrap(), before);
    }

    #[actix_web::test]
    async fn running_task_blocks_punch_out() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        service.punch_in("EMP001").await.unwrap();
        let before = store.get("EMP001", d(2025, 1, 14)).unwrap();
        store.set_task_running("EMP001", true);

        service.clock.set(d(2025, 1, 14), 18, 0);
        let err = service.punch_out("EMP001").await.unwrap_err();
        assert!(matches!(err, AttendanceError::TaskInProgress));
        assert_eq!(store.get("EMP001", d(2025, 1, 14)).unwrap(), before);

        store.set_task_running("EMP001", false);
        let closed = service.punch_out("EMP001").await.unwrap();
        assert_eq!(format_hms(closed.durations.office_hours), "09:00:00");
    }

    #[actix_web::test]
    async fn work_requires_tasks_and_blocks_on_running_task() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        let err = service.start_work("EMP001").await.unwrap_err();
        assert!(matches!(err, AttendanceError::NoTasksAssigned));

        store.assign_task("EMP001");
        let record = service.start_work("EMP001").await.unwrap();
        assert_eq!(record.work_start, Some(t(9, 0)));
        assert_eq!(record.time_in, None);
        assert_eq!(record.status, AttendanceStatus::NotSet);

        store.set_task_running("EMP001", true);
        service.clock.set(d(2025, 1, 14), 17, 0);
        let err = service.end_work("EMP001").await.unwrap_err();
        assert!(matches!(err, AttendanceError::TaskInProgress));

        store.set_task_running("EMP001", false);
        let record = service.end_work("EMP001").await.unwrap();
        assert_eq!(format_hms(record.durations.work_duration), "08:00:00");
    }

    #[actix_web::test]
    async fn starting_a_break_pauses_running_tasks() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        service.punch_in("EMP001").await.unwrap();
        store.set_task_running("EMP001", true);

        service.clock.set(d(2025, 1, 14), 11, 0);
        let outcome = service.start_pause("EMP001", Pause::Break).await.unwrap();
        assert_eq!(outcome.start, Some(t(11, 0)));
        assert_eq!(outcome.limit_minutes, 30);
        assert_eq!(store.paused_at(), vec![("EMP001".to_string(), t(11, 0))]);

        service.clock.set(d(2025, 1, 14), 11, 40);
        let outcome = service.end_pause("EMP001", Pause::Break).await.unwrap();
        assert_eq!(format_hms(outcome.duration), "00:40:00");
        assert!(outcome.over_limit);
    }

    #[actix_web::test]
    async fn break_is_kept_when_tasks_cannot_be_paused() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        service.punch_in("EMP001").await.unwrap();
        store.set_task_running("EMP001", true);
        store.fail_task_pauses();

        service.clock.set(d(2025, 1, 14), 11, 0);
        let outcome = service.start_pause("EMP001", Pause::Break).await.unwrap();
        assert_eq!(outcome.start, Some(t(11, 0)));
        assert_eq!(
            store.get("EMP001", d(2025, 1, 14)).unwrap().break_start,
            Some(t(11, 0))
        );
    }

    #[actix_web::test]
    async fn break_limits_fall_back_to_policy_until_saved() {
        let (service, _) = service_at(d(2025, 1, 14), 9, 0);
        assert_eq!(service.break_limits().await.unwrap(), Policy::default().limits());

        for bad in [(0, 45), (30, 481)] {
            let limits = BreakLimits {
                break_minutes: bad.0,
                lunch_minutes: bad.1,
            };
            assert!(matches!(
                service.set_break_limits(limits).await,
                Err(AttendanceError::Validation(_))
            ));
        }

        let saved = BreakLimits {
            break_minutes: 20,
            lunch_minutes: 60,
        };
        service.set_break_limits(saved).await.unwrap();
        assert_eq!(service.break_limits().await.unwrap(), saved);
        assert_eq!(service.today_status("EMP001").await.unwrap().limits, saved);

        service.punch_in("EMP001").await.unwrap();
        service.clock.set(d(2025, 1, 14), 11, 0);
        service.start_pause("EMP001", Pause::Break).await.unwrap();
        service.clock.set(d(2025, 1, 14), 11, 25);
        let outcome = service.end_pause("EMP001", Pause::Break).await.unwrap();
        assert_eq!(outcome.limit_minutes, 20);
        assert!(outcome.over_limit);
    }

    #[actix_web::test]
    async fn break_during_lunch_is_rejected() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        service.punch_in("EMP001").await.unwrap();
        service.clock.set(d(2025, 1, 14), 13, 0);
        service.start_pause("EMP001", Pause::Lunch).await.unwrap();

        let err = service.start_pause("EMP001", Pause::Break).await.unwrap_err();
        assert!(matches!(err, AttendanceError::LunchInProgress));
        assert_eq!(store.get("EMP001", d(2025, 1, 14)).unwrap().break_start, None);
    }

    #[actix_web::test]
    async fn inactive_and_unknown_employees_are_rejected() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        assert!(matches!(
            service.punch_in("EMP404").await,
            Err(AttendanceError::EmployeeNotFound(_))
        ));
        store.deactivate("EMP001");
        assert!(matches!(
            service.punch_in("EMP001").await,
            Err(AttendanceError::EmployeeInactive(_))
        ));
    }

    #[actix_web::test]
    async fn today_status_defaults_without_record() {
        let (service, _) = service_at(d(2025, 1, 14), 8, 0);
        let status = service.today_status("EMP001").await.unwrap();
        assert!(!status.punched_in);
        assert_eq!(status.attendance.status, AttendanceStatus::NotSet);
        assert_eq!(status.limits.lunch_minutes, 45);
        assert_eq!(status.pending_missed_punchout, None);
    }

    #[actix_web::test]
    async fn key_learning_needs_punch_in() {
        let (service, _) = service_at(d(2025, 1, 14), 9, 0);
        assert!(matches!(
            service.update_key_learning("EMP001", "borrow checker").await,
            Err(AttendanceError::NotPunchedIn)
        ));
        service.punch_in("EMP001").await.unwrap();
        assert!(matches!(
            service.update_key_learning("EMP001", "   ").await,
            Err(AttendanceError::Validation(_))
        ));
        service
            .update_key_learning("EMP001", " borrow checker ")
            .await
            .unwrap();
        let saved = service.key_learning("EMP001").await.unwrap();
        assert_eq!(saved.key_learning.as_deref(), Some("borrow checker"));
    }

    #[actix_web::test]
    async fn admin_edit_replays_classification() {
        let (service, _) = service_at(d(2025, 1, 14), 9, 0);
        service.punch_in("EMP001").await.unwrap();

        let edited = service
            .edit_record(
                "EMP001",
                d(2025, 1, 14),
                AttendanceEdit {
                    time_in: Some(t(10, 0)),
                    time_out: Some(t(18, 0)),
                    status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.status, AttendanceStatus::Late);
        assert_eq!(format_hms(edited.durations.working_hours), "08:00:00");

        let forced = service
            .edit_record(
                "EMP001",
                d(2025, 1, 14),
                AttendanceEdit {
                    status: Some(AttendanceStatus::Present),
                    ..AttendanceEdit::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(forced.status, AttendanceStatus::Present);
        assert_eq!(forced.time_in, Some(t(10, 0)));
    }

    #[actix_web::test]
    async fn admin_add_checks_joining_date_and_duplicates() {
        let (service, _) = service_at(d(2025, 1, 14), 9, 0);
        let new = |date| NewAttendance {
            date,
            time_in: Some(t(9, 0)),
            time_out: Some(t(17, 0)),
            status: AttendanceStatus::Present,
        };

        assert!(matches!(
            service.add_record("EMP001", new(d(2025, 1, 9))).await,
            Err(AttendanceError::BeforeJoiningDate { .. })
        ));
        assert!(matches!(
            service.add_record("EMP001", new(d(2025, 1, 15))).await,
            Err(AttendanceError::Validation(_))
        ));

        let added = service.add_record("EMP001", new(d(2025, 1, 13))).await.unwrap();
        assert_eq!(format_hms(added.durations.working_hours), "08:00:00");
        assert!(matches!(
            service.add_record("EMP001", new(d(2025, 1, 13))).await,
            Err(AttendanceError::AttendanceExists { .. })
        ));
    }

    #[actix_web::test]
    async fn overview_counts_todays_presence() {
        let (service, store) = service_at(d(2025, 1, 14), 9, 0);
        store.add_employee("EMP002", d(2025, 1, 10));
        store.add_employee("EMP003", d(2025, 1, 10));
        service.punch_in("EMP001").await.unwrap();
        store.put(AttendanceRecord::absent("EMP002", d(2025, 1, 14)));

        let overview = service.overview().await.unwrap();
        assert_eq!(overview.total_employees, 3);
        assert_eq!(overview.present_today, 1);
        assert_eq!(overview.absent_today, 1);
    }
}
