use chrono::NaiveDateTime;
use sqlx::FromRow;

/// Full employee row, including the password hash. Never serialized
/// directly; API responses go through `api::admin::EmployeeResponse`.
#[derive(Debug, FromRow)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}
