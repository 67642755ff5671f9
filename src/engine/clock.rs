use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Source of "now" in the reference timezone.
pub trait Clock {
    /// Local wall time in the reference zone, truncated to whole seconds
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let local = Utc::now().with_timezone(&self.tz).naive_local();
        local.with_nanosecond(0).unwrap_or(local)
    }
}

#[cfg(test)]
pub use fixed::FixedClock;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_anchored_on_configured_zone() {
        let ist = SystemClock::new(chrono_tz::Asia::Kolkata).now();
        let utc = Utc::now().naive_utc();
        let offset = ist - utc;
        // IST is UTC+05:30, allow for the two reads straddling a second
        assert!((offset.num_seconds() - 19_800).abs() <= 2);
        assert_eq!(ist.nanosecond(), 0);
    }
}
