use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn issue(
    employee_id: u64,
    employee_code: String,
    role: String,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> (String, Claims) {
    let claims = Claims {
        employee_id,
        sub: employee_code,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("HS256 signing cannot fail with a valid secret");

    (token, claims)
}

pub fn generate_access_token(
    employee_id: u64,
    employee_code: String,
    role: String,
    secret: &str,
    ttl: usize,
) -> String {
    issue(employee_id, employee_code, role, TokenType::Access, secret, ttl).0
}

/// Refresh tokens are persisted by jti, so the claims are returned too.
pub fn generate_refresh_token(
    employee_id: u64,
    employee_code: String,
    role: String,
    secret: &str,
    ttl: usize,
) -> (String, Claims) {
    issue(employee_id, employee_code, role, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn access_token_round_trips() {
        let token =
            generate_access_token(42, "EMP-042".into(), "employee".into(), SECRET, 900);
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.employee_id, 42);
        assert_eq!(claims.sub, "EMP-042");
        assert_eq!(claims.role, "employee");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_token_carries_its_jti() {
        let (token, issued) =
            generate_refresh_token(7, "EMP-007".into(), "hr".into(), SECRET, 3600);
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token =
            generate_access_token(42, "EMP-042".into(), "employee".into(), SECRET, 900);
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
