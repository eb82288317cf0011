use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::models::RegisterReqDto;
use crate::service::attendance as service;
use crate::utils::code_cache;
use crate::utils::code_filter;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "employee")]
    pub role: String,
    pub is_active: bool,
}

/// true  => code/email AVAILABLE
/// false => code/email TAKEN
pub async fn is_identifier_available(identifier: &str, pool: &MySqlPool) -> bool {
    let identifier = identifier.to_lowercase();

    // Cuckoo filter - fast negative
    if !code_filter::might_exist(&identifier) {
        return true;
    }

    // Moka cache - fast positive
    if code_cache::is_taken(&identifier).await {
        return false;
    }

    // Database fallback
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE employee_code = ? OR email = ? LIMIT 1)",
    )
    .bind(&identifier)
    .bind(&identifier)
    .fetch_one(pool)
    .await
    .unwrap_or(1); // fail-safe

    exists == 0
}

/// Inserts a new employee and keeps the filter/cache populated
async fn insert_employee(
    body: &RegisterReqDto,
    role: Role,
    pool: &MySqlPool,
) -> Result<(), HttpResponse> {
    let hashed = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Password hashing failed");
            return Err(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to register employee"
            })));
        }
    };

    let result = sqlx::query(
        r#"
        INSERT INTO employees (employee_code, full_name, email, password_hash, role)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(body.employee_code.trim())
    .bind(body.full_name.trim())
    .bind(body.email.trim())
    .bind(&hashed)
    .bind(role.as_str())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            code_filter::insert(body.employee_code.trim());
            code_filter::insert(body.email.trim());
            code_cache::mark_taken(body.employee_code.trim()).await;
            code_cache::mark_taken(body.email.trim()).await;
            Ok(())
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(HttpResponse::Conflict().json(json!({
                        "message": "Employee code or email already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to insert employee");
            Err(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to register employee"
            })))
        }
    }
}

/// Admin registers a new employee.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReqDto,
    responses(
        (status = 201, description = "Employee registered", body = Object, example = json!({
            "message": "Employee registered successfully"
        })),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Code or email already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn register(
    auth: AuthUser,
    body: web::Json<RegisterReqDto>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let code = body.employee_code.trim();
    if code.is_empty()
        || body.full_name.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "employee_code, full_name, email and password are required"
        })));
    }

    let role = match Role::from_name(body.role.as_deref().unwrap_or("employee")) {
        Some(role) => role,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "Invalid role. Allowed: admin, hr, employee"
            })));
        }
    };

    if !is_identifier_available(code, pool.get_ref()).await
        || !is_identifier_available(&body.email, pool.get_ref()).await
    {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Employee code or email already exists"
        })));
    }

    // Safe to insert after DB check
    match insert_employee(&body, role, pool.get_ref()).await {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Employee registered successfully"
        }))),
        Err(err_resp) => Ok(err_resp),
    }
}

/// Active employees (HR/Admin).
#[utoipa::path(
    get,
    path = "/api/v1/admin/employees",
    responses(
        (status = 200, description = "Active employees", body = [EmployeeResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employees = sqlx::query_as::<_, EmployeeResponse>(
        r#"
        SELECT id, employee_code, full_name, email, role, is_active
        FROM employees
        WHERE is_active = 1
        ORDER BY employee_code
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to list employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(employees))
}

/// One employee's profile plus their full summary and log history (HR/Admin).
#[utoipa::path(
    get,
    path = "/api/v1/admin/employees/{employee_id}/attendance",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee with attendance history"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let employee = sqlx::query_as::<_, EmployeeResponse>(
        r#"
        SELECT id, employee_code, full_name, email, role, is_active
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let employee = match employee {
        Some(employee) => employee,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "message": "Employee not found"
            })));
        }
    };

    let summary =
        service::list_summaries(pool.get_ref(), Some(employee_id), None, None, None).await?;
    let logs = service::list_logs(pool.get_ref(), Some(employee_id), None, None).await?;

    Ok(HttpResponse::Ok().json(json!({
        "employee": employee,
        "summary": summary,
        "logs": logs
    })))
}
