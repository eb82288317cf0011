use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceLog, DailySummaryRow, EventKind};
use crate::service::attendance as service;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

/// Provenance label recorded on events created through these endpoints.
const WEB_SOURCE: &str = "web";

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    /// Inclusive lower bound on the event/summary date
    #[param(example = "2026-08-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the event/summary date
    #[param(example = "2026-08-06", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminLogQuery {
    /// Scope to one employee
    #[param(example = 42)]
    pub employee_id: Option<u64>,
    #[param(example = "2026-08-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[param(example = "2026-08-06", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminSummaryQuery {
    /// Scope to one employee
    #[param(example = 42)]
    pub employee_id: Option<u64>,
    /// Exact date; start_date/end_date are ignored when given
    #[param(example = "2026-08-06", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    #[param(example = "2026-08-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[param(example = "2026-08-31", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/in",
    responses(
        (status = 200, description = "IN event recorded", body = AttendanceLog),
        (status = 400, description = "Already checked in", body = Object, example = json!({
            "message": "Already checked in"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let log =
        service::mark_attendance(pool.get_ref(), auth.employee_id, EventKind::In, WEB_SOURCE)
            .await?;
    Ok(HttpResponse::Ok().json(log))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/out",
    responses(
        (status = 200, description = "OUT event recorded", body = AttendanceLog),
        (status = 400, description = "Already checked out", body = Object, example = json!({
            "message": "Already checked out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let log =
        service::mark_attendance(pool.get_ref(), auth.employee_id, EventKind::Out, WEB_SOURCE)
            .await?;
    Ok(HttpResponse::Ok().json(log))
}

/// Record the opposite of the caller's current status.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/toggle",
    responses(
        (status = 200, description = "Status toggled", body = Object, example = json!({
            "message": "Checked IN successfully",
            "status": "IN"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn toggle(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let log = service::toggle_attendance(pool.get_ref(), auth.employee_id, WEB_SOURCE).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Checked {} successfully", log.event_type),
        "status": log.event_type
    })))
}

/// Current IN/OUT status, derived from today's last event only.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/status",
    responses(
        (status = 200, description = "Current status", body = Object, example = json!({
            "status": "OUT"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let status = service::current_status(pool.get_ref(), auth.employee_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": status })))
}

/// The caller's own event log, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/logs",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Attendance events", body = [AttendanceLog]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<impl Responder> {
    let logs = service::list_logs(
        pool.get_ref(),
        Some(auth.employee_id),
        query.start_date,
        query.end_date,
    )
    .await?;
    Ok(HttpResponse::Ok().json(logs))
}

/// The caller's own daily summaries, newest date first.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/summary",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Daily summaries", body = [DailySummaryRow]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<impl Responder> {
    let summaries = service::list_summaries(
        pool.get_ref(),
        Some(auth.employee_id),
        query.start_date,
        query.end_date,
        None,
    )
    .await?;
    Ok(HttpResponse::Ok().json(summaries))
}

/// Cross-employee event log (HR/Admin).
#[utoipa::path(
    get,
    path = "/api/v1/admin/attendance/logs",
    params(AdminLogQuery),
    responses(
        (status = 200, description = "Attendance events", body = [AttendanceLog]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdminLogQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let logs = service::list_logs(
        pool.get_ref(),
        query.employee_id,
        query.start_date,
        query.end_date,
    )
    .await?;
    Ok(HttpResponse::Ok().json(logs))
}

/// Cross-employee daily summaries (HR/Admin). `date` wins over the range.
#[utoipa::path(
    get,
    path = "/api/v1/admin/attendance/summary",
    params(AdminSummaryQuery),
    responses(
        (status = 200, description = "Daily summaries", body = [DailySummaryRow]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_summaries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdminSummaryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let summaries = service::list_summaries(
        pool.get_ref(),
        query.employee_id,
        query.start_date,
        query.end_date,
        query.date,
    )
    .await?;
    Ok(HttpResponse::Ok().json(summaries))
}
