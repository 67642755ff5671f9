use crate::api::Service;
use crate::auth::auth::AuthUser;
use crate::engine::history::Period;
use crate::engine::machine::Pause;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// daily, weekly, monthly, yearly or range
    #[schema(example = "monthly")]
    pub period: Option<String>,
    /// Required for `yearly`
    #[schema(example = 2025)]
    pub year: Option<i32>,
    /// Required for `yearly`, 1-12
    #[schema(example = 1)]
    pub month: Option<u32>,
    /// Required for `range`
    #[schema(example = "2025-01-01", format = "date", value_type = Option<String>)]
    pub start: Option<NaiveDate>,
    /// Required for `range`
    #[schema(example = "2025-01-31", format = "date", value_type = Option<String>)]
    pub end: Option<NaiveDate>,
}

impl HistoryQuery {
    pub fn period(&self) -> Result<Period, crate::engine::error::AttendanceError> {
        Period::from_query(
            self.period.as_deref().unwrap_or("monthly"),
            self.year,
            self.month,
            self.start,
            self.end,
        )
    }
}

#[derive(Deserialize, ToSchema)]
pub struct KeyLearningReq {
    #[schema(example = "Learned how lifetimes flow through async fns")]
    pub key_learning: String,
}

#[derive(Deserialize, ToSchema)]
pub struct MissedPunchoutReq {
    #[schema(example = "Forgot to punch out, left at six")]
    pub reason: String,
    #[schema(example = "18:00:00", value_type = String)]
    pub time: NaiveTime,
}

fn ok(message: &str, data: impl serde::Serialize) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "data": data
    }))
}

/// Punch in for today
#[utoipa::path(
    post,
    path = "/api/attendance/punchin",
    responses(
        (status = 200, description = "Punched in", body = Object, example = json!({
            "success": true,
            "message": "Punched in successfully",
            "data": { "attendance": { "time_in": "09:45:00", "status": "late" }, "late_by": "15 min late" }
        })),
        (status = 409, description = "Already punched in today", body = Object, example = json!({
            "code": "ALREADY_PUNCHED_IN",
            "message": "Already punched in today",
            "success": false
        })),
        (status = 423, description = "Missed punch-out remark pending"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn punch_in(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    let outcome = service.punch_in(auth.emp_id()?).await?;
    Ok(ok("Punched in successfully", outcome))
}

/// Punch out for today
#[utoipa::path(
    put,
    path = "/api/attendance/punchout",
    responses(
        (status = 200, description = "Punched out", body = Object, example = json!({
            "success": true,
            "message": "Punched out successfully",
            "data": {
                "time_out": "18:00:00",
                "working_hours": "08:15:00",
                "office_hours": "09:00:00",
                "work_duration": "00:00:00",
                "break_duration": "00:15:00",
                "lunch_duration": "00:30:00",
                "status": "present"
            }
        })),
        (status = 409, description = "Break, lunch, work session or task still open", body = Object, example = json!({
            "code": "TASK_IN_PROGRESS",
            "message": "A task is still running",
            "success": false
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn punch_out(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    let record = service.punch_out(auth.emp_id()?).await?;
    Ok(ok("Punched out successfully", record))
}

/// Start the focused work session
#[utoipa::path(
    post,
    path = "/api/attendance/work-start",
    responses(
        (status = 200, description = "Work started", body = Object, example = json!({
            "success": true,
            "message": "Work started",
            "data": { "work_start": "09:50:00" }
        })),
        (status = 409, description = "No tasks assigned or work already started"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn work_start(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    let record = service.start_work(auth.emp_id()?).await?;
    Ok(ok("Work started", record))
}

/// End the focused work session
#[utoipa::path(
    post,
    path = "/api/attendance/work-end",
    responses(
        (status = 200, description = "Work ended", body = Object, example = json!({
            "success": true,
            "message": "Work ended",
            "data": { "work_end": "17:50:00", "work_duration": "08:00:00" }
        })),
        (status = 409, description = "Work not started, already ended or a task is running"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn work_end(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    let record = service.end_work(auth.emp_id()?).await?;
    Ok(ok("Work ended", record))
}

async fn start_pause(
    auth: AuthUser,
    service: web::Data<Service>,
    pause: Pause,
    message: &str,
) -> actix_web::Result<HttpResponse> {
    let outcome = service.start_pause(auth.emp_id()?, pause).await?;
    Ok(ok(message, outcome))
}

async fn end_pause(
    auth: AuthUser,
    service: web::Data<Service>,
    pause: Pause,
    message: &str,
) -> actix_web::Result<HttpResponse> {
    let outcome = service.end_pause(auth.emp_id()?, pause).await?;
    Ok(ok(message, outcome))
}

/// Start today's break, pausing any running task
#[utoipa::path(
    put,
    path = "/api/attendance/break/start",
    responses(
        (status = 200, description = "Break started", body = Object, example = json!({
            "success": true,
            "message": "Break started",
            "data": { "kind": "break", "start": "11:00:00", "limit_minutes": 30 }
        })),
        (status = 409, description = "Lunch in progress or break already taken"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn break_start(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    start_pause(auth, service, Pause::Break, "Break started").await
}

/// End today's break
#[utoipa::path(
    put,
    path = "/api/attendance/break/end",
    responses(
        (status = 200, description = "Break ended", body = Object, example = json!({
            "success": true,
            "message": "Break ended",
            "data": { "kind": "break", "end": "11:40:00", "duration": "00:40:00", "limit_minutes": 30, "over_limit": true }
        })),
        (status = 409, description = "Break not started"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn break_end(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    end_pause(auth, service, Pause::Break, "Break ended").await
}

/// Start today's lunch, pausing any running task
#[utoipa::path(
    put,
    path = "/api/attendance/lunch/start",
    responses(
        (status = 200, description = "Lunch started", body = Object),
        (status = 409, description = "Break in progress or lunch already taken"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn lunch_start(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    start_pause(auth, service, Pause::Lunch, "Lunch started").await
}

/// End today's lunch
#[utoipa::path(
    put,
    path = "/api/attendance/lunch/end",
    responses(
        (status = 200, description = "Lunch ended", body = Object),
        (status = 409, description = "Lunch not started"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn lunch_end(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    end_pause(auth, service, Pause::Lunch, "Lunch ended").await
}

/// Snapshot of today's attendance
#[utoipa::path(
    get,
    path = "/api/attendance/today-status",
    responses(
        (status = 200, description = "Today's attendance", body = Object, example = json!({
            "success": true,
            "message": "Today's status",
            "data": {
                "date": "2025-01-14",
                "punched_in": true,
                "punched_out": false,
                "working": false,
                "on_break": false,
                "at_lunch": false,
                "limits": { "break": 30, "lunch": 45 },
                "pending_missed_punchout": null
            }
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    let status = service.today_status(auth.emp_id()?).await?;
    Ok(ok("Today's status", status))
}

/// Gap-filled attendance history of the caller
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History for the requested period", body = Object, example = json!({
            "success": true,
            "message": "Attendance history",
            "data": {
                "records": [
                    { "date": "2025-01-13", "time_in": null, "time_out": null, "status": "absent", "isPresent": false, "working_hours": "00:00:00" }
                ],
                "averageWorkingHours": "04:00:00",
                "totalPresent": 1,
                "totalAbsent": 1,
                "totalNotSet": 2,
                "startDate": "2025-01-10",
                "endDate": "2025-01-14"
            }
        })),
        (status = 400, description = "Invalid period, month or range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    service: web::Data<Service>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let report = service.history(auth.emp_id()?, query.period()?).await?;
    Ok(ok("Attendance history", report))
}

/// Save today's key learning
#[utoipa::path(
    put,
    path = "/api/attendance/key-learning",
    request_body = KeyLearningReq,
    responses(
        (status = 200, description = "Key learning saved", body = Object),
        (status = 400, description = "Empty or too long"),
        (status = 409, description = "Not punched in today"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn update_key_learning(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<KeyLearningReq>,
) -> actix_web::Result<impl Responder> {
    let saved = service
        .update_key_learning(auth.emp_id()?, &payload.key_learning)
        .await?;
    Ok(ok("Key learning saved", saved))
}

/// Today's key learning
#[utoipa::path(
    get,
    path = "/api/attendance/key-learning",
    responses(
        (status = 200, description = "Key learning of today", body = Object, example = json!({
            "success": true,
            "message": "Key learning",
            "data": { "date": "2025-01-14", "key_learning": null }
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_key_learning(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    let saved = service.key_learning(auth.emp_id()?).await?;
    Ok(ok("Key learning", saved))
}

/// Explain a missed punch-out and unblock attendance
#[utoipa::path(
    post,
    path = "/api/attendance/missed-punchout",
    request_body = MissedPunchoutReq,
    responses(
        (status = 200, description = "Missed punch-out resolved", body = Object),
        (status = 400, description = "Blank reason or time before punch-in"),
        (status = 409, description = "No missed punch-out pending", body = Object, example = json!({
            "code": "NO_PENDING_MISSED_PUNCHOUT",
            "message": "No missed punch-out is pending",
            "success": false
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn missed_punchout(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<MissedPunchoutReq>,
) -> actix_web::Result<impl Responder> {
    let record = service
        .submit_missed_punchout_remark(auth.emp_id()?, &payload.reason, payload.time)
        .await?;
    Ok(ok("Missed punch-out resolved", record))
}
