use crate::{
    api::{admin, attendance, settings},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiter shared by every worker
pub fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} per minute"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, protected_limiter: Limiter) {

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .route("/punchin", web::post().to(attendance::punch_in))
                    .route("/punchout", web::put().to(attendance::punch_out))
                    .route("/work-start", web::post().to(attendance::work_start))
                    .route("/work-end", web::post().to(attendance::work_end))
                    .route("/break/start", web::put().to(attendance::break_start))
                    .route("/break/end", web::put().to(attendance::break_end))
                    .route("/lunch/start", web::put().to(attendance::lunch_start))
                    .route("/lunch/end", web::put().to(attendance::lunch_end))
                    .route("/today-status", web::get().to(attendance::today_status))
                    .route("/history", web::get().to(attendance::history))
                    .service(
                        web::resource("/key-learning")
                            .route(web::put().to(attendance::update_key_learning))
                            .route(web::get().to(attendance::get_key_learning)),
                    )
                    .route("/missed-punchout", web::post().to(attendance::missed_punchout))
                    .route("/dashboard/{emp_id}", web::get().to(admin::dashboard))
                    // admin
                    .route("/all", web::get().to(admin::all_attendance))
                    .route("/report/{emp_id}", web::get().to(admin::report))
                    .route("/admin/overview", web::get().to(admin::overview))
                    .route("/admin/report", web::get().to(admin::team_report))
                    .service(
                        web::resource("/break-limits")
                            .route(web::get().to(settings::get_break_limits))
                            .route(web::put().to(settings::set_break_limits)),
                    )
                    .route("/admin", web::post().to(admin::add_attendance))
                    .service(
                        web::resource("/admin/{emp_id}/{date}")
                            .route(web::get().to(admin::get_attendance))
                            .route(web::put().to(admin::edit_attendance)),
                    ),
            ),
    );
}
