use crate::api::employee::EmployeeResponse;
use crate::auth::handlers::LoginResponse;
use crate::model::attendance::{AttendanceLog, DailySummaryRow, EventKind};
use crate::models::{LoginReqDto, RegisterReqDto};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Employee Attendance System API",
        version = "1.0.0",
        description = r#"
## Employee Attendance System

Backend API for tracking employee IN/OUT attendance events and the
per-day summaries derived from them.

### Key Features
- **Attendance**
  - Check in / check out / toggle, with a strict same-kind-twice guard per day
  - Current IN/OUT status derived from today's last event
  - Event log and daily summary queries with date filters
- **Administration**
  - Admin-registered employee accounts
  - Cross-employee logs and summaries for Admin/HR

### Security
All attendance endpoints require **JWT Bearer authentication**.
Cross-employee views are restricted to **Admin** and **HR** roles.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::employee::register,
        crate::api::employee::list_employees,
        crate::api::employee::employee_attendance,

        crate::api::attendance::mark_in,
        crate::api::attendance::mark_out,
        crate::api::attendance::toggle,
        crate::api::attendance::status,
        crate::api::attendance::my_logs,
        crate::api::attendance::my_summary,
        crate::api::attendance::admin_logs,
        crate::api::attendance::admin_summaries
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            RegisterReqDto,
            EmployeeResponse,
            EventKind,
            AttendanceLog,
            DailySummaryRow
        )
    ),
    tags(
        (name = "Auth", description = "Authentication APIs"),
        (name = "Attendance", description = "Attendance tracking APIs"),
        (name = "Admin", description = "Admin/HR reporting APIs"),
    )
)]
pub struct ApiDoc;
