use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    model::employee::Employee,
    models::{LoginReqDto, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "employee")]
    pub role: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
}

/// Login with employee code or email + password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Tokens issued", body = LoginResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, body))]
pub async fn login(
    body: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    let identifier = body
        .employee_code
        .as_deref()
        .or(body.email.as_deref())
        .unwrap_or("")
        .trim()
        .to_owned();

    if identifier.is_empty() || body.password.is_empty() {
        info!("Validation failed: missing identifier or password");
        return HttpResponse::BadRequest().json(json!({
            "message": "Employee code/email and password required"
        }));
    }

    debug!("Fetching employee from database");

    let employee = match sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_code, full_name, email, password_hash, role, is_active, created_at
        FROM employees
        WHERE (employee_code = ? OR email = ?) AND is_active = 1
        "#,
    )
    .bind(&identifier)
    .bind(&identifier)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(employee)) => {
            debug!(employee_id = employee.id, "Employee found");
            employee
        }
        Ok(None) => {
            info!("Invalid credentials: employee not found");
            return HttpResponse::Unauthorized().json(json!({
                "message": "Invalid credentials"
            }));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching employee");
            return HttpResponse::InternalServerError().finish();
        }
    };

    debug!("Verifying password");

    if verify_password(&body.password, &employee.password_hash).is_err() {
        info!("Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({
            "message": "Invalid credentials"
        }));
    }

    debug!("Generating tokens");

    let access_token = generate_access_token(
        employee.id,
        employee.employee_code.clone(),
        employee.role.clone(),
        &config.jwt_secret,
        config.access_token_ttl,
    );

    let (refresh_token, refresh_claims) = generate_refresh_token(
        employee.id,
        employee.employee_code.clone(),
        employee.role.clone(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    debug!(
        employee_id = employee.id,
        jti = %refresh_claims.jti,
        "Storing refresh token"
    );

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (employee_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(employee.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    // non-fatal
    if let Err(e) = sqlx::query("UPDATE employees SET last_login_at = NOW() WHERE id = ?")
        .bind(employee.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        role: employee.role,
        full_name: employee.full_name,
        employee_code: employee.employee_code,
    })
}

/// Rotate a refresh token and issue a fresh access token.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair issued"),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().json(json!({"message": "No token"})),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().json(json!({"message": "Invalid token"})),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let record = match sqlx::query_as::<_, (u64, u64, bool)>(
        r#"
        SELECT id, employee_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let (record_id, employee_id) = match record {
        Some((id, employee_id, revoked)) if !revoked => (id, employee_id),
        _ => return HttpResponse::Unauthorized().finish(),
    };

    // old refresh token is single-use
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let (new_refresh_token, new_claims) = generate_refresh_token(
        claims.employee_id,
        claims.sub.clone(),
        claims.role.clone(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    );

    if let Err(e) = sqlx::query(
        r#"
        INSERT INTO refresh_tokens (employee_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(employee_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(pool.get_ref())
    .await
    {
        error!(error = %e, "Failed to store rotated refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    let access_token = generate_access_token(
        claims.employee_id,
        claims.sub.clone(),
        claims.role.clone(),
        &config.jwt_secret,
        config.access_token_ttl,
    );

    HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    }))
}

/// Revoke the presented refresh token. Idempotent; always 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::NoContent().finish(),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::NoContent().finish(),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await;

    HttpResponse::NoContent().finish()
}
