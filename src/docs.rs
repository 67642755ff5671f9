use crate::api::admin::{AddAttendanceReq, EditAttendanceReq};
use crate::api::attendance::{HistoryQuery, KeyLearningReq, MissedPunchoutReq};
use crate::api::settings::BreakLimitsReq;
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::Employee;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracking

Records each employee's daily punch-in and punch-out, the focused work
session, one break and one lunch, and derives the day's status and worked
durations from those timestamps.

### Key Features
- **Punching**
  - Punch in and out, with late and half-day classification
- **Sub-sessions**
  - Work, break and lunch tracking, with break and lunch limits reported
- **History**
  - Daily, weekly, monthly, per-month or explicit range reports that fill
    days without records as absent or not set
- **Missed punch-out recovery**
  - Unclosed days are flagged overnight and block attendance until a reason
    and leave time are submitted
- **Admin**
  - Add and correct attendance, reports for any employee, daily headcount
  - Team report over a period and the full attendance log
- **Settings**
  - Break and lunch limits, overriding the configured defaults

### Security
Every endpoint requires a **JWT Bearer** access token. Admin endpoints
require the Admin or HR role.

### Response Format
Successful responses carry `success`, `message` and `data`. Errors carry
a machine-readable `code`, a `message` and `success: false`.
"#,
    ),
    paths(
        crate::api::attendance::punch_in,
        crate::api::attendance::punch_out,
        crate::api::attendance::work_start,
        crate::api::attendance::work_end,
        crate::api::attendance::break_start,
        crate::api::attendance::break_end,
        crate::api::attendance::lunch_start,
        crate::api::attendance::lunch_end,
        crate::api::attendance::today_status,
        crate::api::attendance::history,
        crate::api::attendance::update_key_learning,
        crate::api::attendance::get_key_learning,
        crate::api::attendance::missed_punchout,

        crate::api::admin::report,
        crate::api::admin::overview,
        crate::api::admin::add_attendance,
        crate::api::admin::get_attendance,
        crate::api::admin::edit_attendance,
        crate::api::admin::all_attendance,
        crate::api::admin::dashboard,
        crate::api::admin::team_report,

        crate::api::settings::get_break_limits,
        crate::api::settings::set_break_limits
    ),
    components(
        schemas(
            AttendanceStatus,
            Employee,
            HistoryQuery,
            KeyLearningReq,
            MissedPunchoutReq,
            AddAttendanceReq,
            EditAttendanceReq,
            BreakLimitsReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Self-service attendance APIs"),
        (name = "Attendance Admin", description = "Attendance administration APIs"),
        (name = "Settings", description = "Break and lunch limits"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
