use chrono::NaiveTime;
use tracing::{info, instrument, warn};

use crate::engine::clock::Clock;
use crate::engine::error::AttendanceError;
use crate::engine::machine;
use crate::engine::service::AttendanceService;
use crate::model::attendance::AttendanceRecord;
use crate::store::{AttendanceRepository, EmployeeDirectory, SettingsStore, TaskService};

impl<R, T, D, S, C> AttendanceService<R, T, D, S, C>
where
    R: AttendanceRepository,
    T: TaskService,
    D: EmployeeDirectory,
    S: SettingsStore,
    C: Clock,
{
    /// Flags every past day that was punched in but never punched out.
    /// Returns how many records were flagged; a second run flags nothing.
    #[instrument(skip(self))]
    pub async fn sweep_missed_punchouts(&self) -> Result<usize, AttendanceError> {
        let today = self.clock.today();
        let unclosed = self.records.find_unclosed_before(today).await?;

        let mut flagged = 0;
        for record in &unclosed {
            let marked = machine::mark_missed_punchout(record);
            self.records.update(&marked).await?;
            warn!(emp_id = %record.emp_id, date = %record.date, "Missed punch-out flagged");
            flagged += 1;
        }

        info!(flagged, %today, "Missed punch-out sweep finished");
        Ok(flagged)
    }

    /// Recovery gate shared with the todo service: fails while the
    /// employee still owes a missed punch-out remark.
    pub async fn ensure_no_pending_missed_punchout(
        &self,
        emp_id: &str,
    ) -> Result<(), AttendanceError> {
        match self.records.find_pending_missed(emp_id).await? {
            Some(pending) => Err(AttendanceError::PendingMissedPunchoutRemark {
                date: pending.date,
            }),
            None => Ok(()),
        }
    }

    #[instrument(skip(self, reason))]
    pub async fn submit_missed_punchout_remark(
        &self,
        emp_id: &str,
        reason: &str,
        time: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let employee = self.employee(emp_id).await?;
        if !employee.is_active() {
            return Err(AttendanceError::EmployeeInactive(emp_id.to_string()));
        }

        let pending = self
            .records
            .find_pending_missed(emp_id)
            .await?
            .ok_or(AttendanceError::NoPendingMissedPunchout)?;
        let resolved = machine::resolve_missed_punchout(&pending, reason, time, &self.policy)?;
        self.records.update(&resolved).await?;

        info!(emp_id, date = %resolved.date, "Missed punch-out resolved");
        Ok(resolved)
    }
}
