use crate::api::Service;
use crate::api::attendance::HistoryQuery;
use crate::auth::auth::AuthUser;
use crate::engine::service::{AttendanceEdit, NewAttendance};
use crate::model::attendance::AttendanceStatus;
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AddAttendanceReq {
    #[schema(example = "EMP001")]
    pub emp_id: String,
    #[schema(example = "2025-01-13", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub time_in: Option<NaiveTime>,
    #[schema(example = "18:00:00", value_type = Option<String>)]
    pub time_out: Option<NaiveTime>,
    #[schema(example = "present")]
    pub status: AttendanceStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct EditAttendanceReq {
    #[schema(example = "09:40:00", value_type = Option<String>)]
    pub time_in: Option<NaiveTime>,
    #[schema(example = "18:00:00", value_type = Option<String>)]
    pub time_out: Option<NaiveTime>,
    /// Skips classification when given
    #[schema(example = "late")]
    pub status: Option<AttendanceStatus>,
}

/// Attendance report of any employee
#[utoipa::path(
    get,
    path = "/api/attendance/report/{emp_id}",
    params(
        ("emp_id", Path, description = "Employee id"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "History for the requested period", body = Object),
        (status = 400, description = "Invalid period, month or range"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn report(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let report = service.history(&path, query.period()?).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": report
    })))
}

/// Today's headcount
#[utoipa::path(
    get,
    path = "/api/attendance/admin/overview",
    responses(
        (status = 200, description = "Present and absent counts for today", body = Object, example = json!({
            "success": true,
            "data": { "date": "2025-01-14", "totalEmployees": 12, "presentToday": 9, "absentToday": 1 }
        })),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn overview(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let overview = service.overview().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": overview
    })))
}

/// Add a missing attendance day
#[utoipa::path(
    post,
    path = "/api/attendance/admin",
    request_body = AddAttendanceReq,
    responses(
        (status = 200, description = "Attendance added", body = Object),
        (status = 400, description = "Before joining date or in the future"),
        (status = 409, description = "Attendance already exists", body = Object, example = json!({
            "code": "ATTENDANCE_EXISTS",
            "message": "Attendance for EMP001 already exists on 2025-01-13",
            "success": false
        })),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn add_attendance(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<AddAttendanceReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let record = service
        .add_record(
            &payload.emp_id,
            NewAttendance {
                date: payload.date,
                time_in: payload.time_in,
                time_out: payload.time_out,
                status: payload.status,
            },
        )
        .await?;

    info!(admin = %auth.username, emp_id = %payload.emp_id, "Attendance added");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Attendance added",
        "data": record
    })))
}

/// One employee's attendance on one date
#[utoipa::path(
    get,
    path = "/api/attendance/admin/{emp_id}/{date}",
    params(
        ("emp_id", Path, description = "Employee id"),
        ("date", Path, description = "Date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Attendance record", body = Object),
        (status = 404, description = "No attendance on that date"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn get_attendance(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<(String, NaiveDate)>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let (emp_id, date) = path.into_inner();
    let record = service.record_for(&emp_id, date).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": record
    })))
}

/// Correct one employee's attendance on one date
#[utoipa::path(
    put,
    path = "/api/attendance/admin/{emp_id}/{date}",
    params(
        ("emp_id", Path, description = "Employee id"),
        ("date", Path, description = "Date, YYYY-MM-DD")
    ),
    request_body = EditAttendanceReq,
    responses(
        (status = 200, description = "Attendance updated", body = Object),
        (status = 404, description = "No attendance on that date"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn edit_attendance(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<(String, NaiveDate)>,
    payload: web::Json<EditAttendanceReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (emp_id, date) = path.into_inner();
    let payload = payload.into_inner();
    let record = service
        .edit_record(
            &emp_id,
            date,
            AttendanceEdit {
                time_in: payload.time_in,
                time_out: payload.time_out,
                status: payload.status,
            },
        )
        .await?;

    info!(admin = %auth.username, %emp_id, %date, "Attendance edited");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Attendance updated",
        "data": record
    })))
}

/// Every stored attendance day with the employee's name, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/all",
    responses(
        (status = 200, description = "All attendance records", body = Object, example = json!({
            "success": true,
            "data": [
                { "emp_id": "EMP001", "name": "John Doe", "date": "2025-01-13", "time_in": "09:00:00", "status": "present" }
            ]
        })),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn all_attendance(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let records = service.all_attendance().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": records
    })))
}

/// Every stored day of one employee, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/dashboard/{emp_id}",
    params(
        ("emp_id", Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Employee dashboard", body = Object, example = json!({
            "success": true,
            "data": { "empId": "EMP001", "totalDays": 1, "records": [] }
        })),
        (status = 403, description = "Own dashboard, or HR/Admin"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn dashboard(
    auth: AuthUser,
    service: web::Data<Service>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_self_or_hr(&path)?;

    let dashboard = service.dashboard(&path).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": dashboard
    })))
}

/// Presence and worked hours of every active employee
#[utoipa::path(
    get,
    path = "/api/attendance/admin/report",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Per-employee counts for the period", body = Object, example = json!({
            "success": true,
            "data": {
                "startDate": "2025-01-13",
                "endDate": "2025-01-15",
                "report": [
                    { "empId": "EMP001", "name": "John Doe", "presentCount": 1, "absentCount": 1, "totalWorkingHours": "08:00:00" }
                ]
            }
        })),
        (status = 400, description = "Invalid period, month or range"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Admin"
)]
pub async fn team_report(
    auth: AuthUser,
    service: web::Data<Service>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let report = service.team_report(query.period()?).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": report
    })))
}
