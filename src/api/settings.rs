use crate::api::Service;
use crate::auth::auth::AuthUser;
use crate::engine::policy::BreakLimits;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct BreakLimitsReq {
    /// Minutes
    #[schema(example = 45)]
    pub lunch: u32,
    /// Minutes
    #[serde(rename = "break")]
    #[schema(example = 30)]
    pub break_minutes: u32,
}

/// Current break and lunch limits
#[utoipa::path(
    get,
    path = "/api/attendance/break-limits",
    responses(
        (status = 200, description = "Limits in minutes", body = Object, example = json!({
            "success": true,
            "data": { "break": 30, "lunch": 45 }
        })),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn get_break_limits(
    auth: AuthUser,
    service: web::Data<Service>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let limits = service.break_limits().await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": limits
    })))
}

/// Override the configured break and lunch limits
#[utoipa::path(
    put,
    path = "/api/attendance/break-limits",
    request_body = BreakLimitsReq,
    responses(
        (status = 200, description = "Limits saved", body = Object, example = json!({
            "success": true,
            "message": "Break limits updated successfully",
            "data": { "break": 20, "lunch": 60 }
        })),
        (status = 400, description = "A limit is zero or longer than a working day"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn set_break_limits(
    auth: AuthUser,
    service: web::Data<Service>,
    payload: web::Json<BreakLimitsReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let limits = service
        .set_break_limits(BreakLimits {
            break_minutes: payload.break_minutes,
            lunch_minutes: payload.lunch,
        })
        .await?;

    info!(admin = %auth.username, "Break limits changed");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Break limits updated successfully",
        "data": limits
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_break_keyword_field() {
        let req: BreakLimitsReq = serde_json::from_str(r#"{"lunch": 60, "break": 20}"#).unwrap();
        assert_eq!((req.break_minutes, req.lunch), (20, 60));
        assert!(serde_json::from_str::<BreakLimitsReq>(r#"{"lunch": 60}"#).is_err());
    }
}
