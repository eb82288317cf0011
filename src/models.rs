use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login accepts either the employee code or the email, plus the password.
#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "EMP-001")]
    pub employee_code: Option<String>,
    #[schema(example = "john.doe@company.com")]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterReqDto {
    #[schema(example = "EMP-002")]
    pub employee_code: String,
    #[schema(example = "Jane Roe")]
    pub full_name: String,
    #[schema(example = "jane.roe@company.com", format = "email", value_type = String)]
    pub email: String,
    pub password: String,
    /// Defaults to `employee`.
    #[schema(example = "employee")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub employee_id: u64,
    /// Employee code.
    pub sub: String,
    /// Role name (`admin` / `hr` / `employee`).
    pub role: String,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
