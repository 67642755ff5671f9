use chrono::NaiveTime;
use serde::Serialize;

use crate::engine::machine::Pause;

/// Fixed cutoffs and limits the engine classifies against.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Punching in after this is late
    pub reporting_time: NaiveTime,
    /// Punching in after this, or out at or before it, is a half day
    pub half_day_cutoff: NaiveTime,
    /// When set, punch-in is closed after this time and the day is recorded absent
    pub absent_cutoff: Option<NaiveTime>,
    pub break_limit_minutes: u32,
    pub lunch_limit_minutes: u32,
}

impl Policy {
    pub fn limits(&self) -> BreakLimits {
        BreakLimits {
            break_minutes: self.break_limit_minutes,
            lunch_minutes: self.lunch_limit_minutes,
        }
    }

}

impl Default for Policy {
    fn default() -> Self {
        Self {
            reporting_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            half_day_cutoff: NaiveTime::from_hms_opt(13, 30, 0).unwrap_or(NaiveTime::MIN),
            absent_cutoff: None,
            break_limit_minutes: 30,
            lunch_limit_minutes: 45,
        }
    }
}

/// Informational only, the engine never rejects an over-long break.
///
/// The env values in [`Policy`] are defaults; an admin may store an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakLimits {
    #[serde(rename = "break")]
    pub break_minutes: u32,
    #[serde(rename = "lunch")]
    pub lunch_minutes: u32,
}

impl BreakLimits {
    pub fn minutes(self, pause: Pause) -> u32 {
        match pause {
            Pause::Break => self.break_minutes,
            Pause::Lunch => self.lunch_minutes,
        }
    }
}
