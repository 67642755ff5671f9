use std::time::Duration;

use actix_web::rt::time::sleep;
use actix_web::web::Data;
use chrono::NaiveDateTime;
use tracing::{error, info};

use crate::api::Service;
use crate::engine::clock::Clock;

/// Slack after midnight so the sweep's "today" has already rolled over.
const ROLLOVER_SLACK: Duration = Duration::from_secs(1);

/// Wall time from `now` until the next local midnight.
pub fn until_next_midnight(now: NaiveDateTime) -> Duration {
    let next = now
        .date()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(now);
    (next - now).to_std().unwrap_or(Duration::ZERO) + ROLLOVER_SLACK
}

/// Runs the missed punch-out sweep now, then after every midnight of the
/// reference zone. Failures wait for the next boundary.
pub async fn run(service: Data<Service>) {
    loop {
        match service.sweep_missed_punchouts().await {
            Ok(flagged) => info!(flagged, "Daily missed punch-out sweep complete"),
            Err(e) => error!(error = %e, "Daily missed punch-out sweep failed"),
        }

        let wait = until_next_midnight(service.clock().now());
        info!(secs = wait.as_secs(), "Next missed punch-out sweep scheduled");
        sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 13)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn waits_until_just_past_midnight() {
        assert_eq!(until_next_midnight(at(23, 59, 0)), Duration::from_secs(61));
        assert_eq!(
            until_next_midnight(at(0, 0, 0)),
            Duration::from_secs(24 * 3600 + 1)
        );
    }
}
