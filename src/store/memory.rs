//! In-memory store for tests.
//!
//! Reads and inserts yield to the executor first, so futures joined in one
//! task interleave between reading a day and writing it the way concurrent
//! requests do against MySQL.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actix_web::rt::task::yield_now;
use chrono::{NaiveDate, NaiveTime};

use crate::engine::policy::BreakLimits;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use crate::store::{
    AttendanceRepository, EmployeeDirectory, SettingsStore, StoreError, TaskService,
};

#[derive(Default)]
struct State {
    records: BTreeMap<(String, NaiveDate), AttendanceRecord>,
    employees: HashMap<String, Employee>,
    open_tasks: HashSet<String>,
    running_tasks: HashSet<String>,
    paused_at: Vec<(String, NaiveTime)>,
    fail_task_pauses: bool,
    break_limits: Option<BreakLimits>,
    creates: usize,
    lost_races: usize,
}

/// Mutex-guarded stand-in for MySQL, keyed by `(emp_id, date)` like the
/// unique index it replaces. Clones share the same state.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_employee(&self, emp_id: &str, joining_date: NaiveDate) {
        self.lock().employees.insert(
            emp_id.to_string(),
            Employee {
                emp_id: emp_id.to_string(),
                name: format!("Employee {emp_id}"),
                joining_date,
                status: "active".to_string(),
            },
        );
    }

    pub fn deactivate(&self, emp_id: &str) {
        if let Some(e) = self.lock().employees.get_mut(emp_id) {
            e.status = "inactive".to_string();
        }
    }

    pub fn assign_task(&self, emp_id: &str) {
        self.lock().open_tasks.insert(emp_id.to_string());
    }

    pub fn set_task_running(&self, emp_id: &str, running: bool) {
        let mut state = self.lock();
        if running {
            state.running_tasks.insert(emp_id.to_string());
        } else {
            state.running_tasks.remove(emp_id);
        }
    }

    pub fn paused_at(&self) -> Vec<(String, NaiveTime)> {
        self.lock().paused_at.clone()
    }

    /// Makes every later `pause_running_tasks` call fail
    pub fn fail_task_pauses(&self) {
        self.lock().fail_task_pauses = true;
    }

    /// Number of rows actually inserted, backfills included
    pub fn creates(&self) -> usize {
        self.lock().creates
    }

    /// Inserts that found the day already taken: duplicates from `create`
    /// and backfills that returned someone else's row
    pub fn lost_races(&self) -> usize {
        self.lock().lost_races
    }

    pub fn put(&self, record: AttendanceRecord) {
        self.lock()
            .records
            .insert((record.emp_id.clone(), record.date), record);
    }

    pub fn get(&self, emp_id: &str, date: NaiveDate) -> Option<AttendanceRecord> {
        self.lock().records.get(&(emp_id.to_string(), date)).cloned()
    }
}

impl AttendanceRepository for MemoryStore {
    async fn find(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        yield_now().await;
        Ok(self.get(emp_id, date))
    }

    async fn find_range(
        &self,
        emp_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        yield_now().await;
        Ok(self
            .lock()
            .records
            .values()
            .filter(|r| r.emp_id == emp_id && r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self
            .lock()
            .records
            .values()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut records: Vec<_> = self.lock().records.values().cloned().collect();
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.emp_id.cmp(&b.emp_id)));
        Ok(records)
    }

    async fn create(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        yield_now().await;
        let mut state = self.lock();
        let key = (record.emp_id.clone(), record.date);
        if state.records.contains_key(&key) {
            state.lost_races += 1;
            return Err(StoreError::Duplicate);
        }
        state.records.insert(key, record.clone());
        state.creates += 1;
        Ok(())
    }

    async fn find_or_create_absent(
        &self,
        emp_id: &str,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError> {
        yield_now().await;
        let mut state = self.lock();
        let key = (emp_id.to_string(), date);
        let existing = state.records.get(&key).cloned();
        if let Some(existing) = existing {
            state.lost_races += 1;
            return Ok(existing);
        }
        let record = AttendanceRecord::absent(emp_id, date);
        state.records.insert(key, record.clone());
        state.creates += 1;
        Ok(record)
    }

    async fn update(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        self.put(record.clone());
        Ok(())
    }

    async fn find_unclosed_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self
            .lock()
            .records
            .values()
            .filter(|r| {
                r.date < date && r.time_in.is_some() && r.time_out.is_none() && !r.missed_punchout
            })
            .cloned()
            .collect())
    }

    async fn find_pending_missed(
        &self,
        emp_id: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .lock()
            .records
            .values()
            .filter(|r| r.emp_id == emp_id && r.missed_punchout)
            .max_by_key(|r| r.date)
            .cloned())
    }
}

impl TaskService for MemoryStore {
    async fn has_running_task(&self, emp_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock().running_tasks.contains(emp_id))
    }

    async fn has_assignable_tasks(&self, emp_id: &str) -> Result<bool, StoreError> {
        let state = self.lock();
        Ok(state.open_tasks.contains(emp_id) || state.running_tasks.contains(emp_id))
    }

    async fn pause_running_tasks(&self, emp_id: &str, at: NaiveTime) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail_task_pauses {
            return Err(StoreError::Corrupt("todo store unavailable".into()));
        }
        if state.running_tasks.remove(emp_id) {
            state.open_tasks.insert(emp_id.to_string());
            state.paused_at.push((emp_id.to_string(), at));
        }
        Ok(())
    }
}

impl EmployeeDirectory for MemoryStore {
    async fn find_employee(&self, emp_id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self.lock().employees.get(emp_id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self
            .lock()
            .employees
            .values()
            .filter(|e| e.is_active())
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self.lock().employees.values().cloned().collect())
    }
}

impl SettingsStore for MemoryStore {
    async fn break_limits(&self) -> Result<Option<BreakLimits>, StoreError> {
        Ok(self.lock().break_limits)
    }

    async fn save_break_limits(&self, limits: BreakLimits) -> Result<(), StoreError> {
        self.lock().break_limits = Some(limits);
        Ok(())
    }
}
