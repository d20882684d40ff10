use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    http::StatusCode,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use phoenix_core::models::User;
use serde::{Deserialize, Serialize};

use crate::state::{AppState, AuthConfig};

pub const CUSTOMER_ROLE: &str = "CUSTOMER";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl CustomerClaims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Expiry timestamp `ttl_seconds` from now, saturating at the latest
/// representable instant instead of wrapping into the past.
fn expires_at(ttl_seconds: u64) -> usize {
    let ttl = i64::try_from(ttl_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX);
    let at = Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    usize::try_from(at.timestamp()).unwrap_or(usize::MAX)
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = CustomerClaims {
        sub: user.user_id.to_string(),
        email: user.email.clone(),
        role: CUSTOMER_ROLE.to_owned(),
        exp: expires_at(auth.expiration),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
}

/// Validate a bearer token and check it belongs to a customer.
fn verify(auth: &AuthConfig, token: &str) -> Result<CustomerClaims, StatusCode> {
    let token_data = decode::<CustomerClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    if token_data.claims.role != CUSTOMER_ROLE {
        return Err(StatusCode::FORBIDDEN);
    }
    if token_data.claims.user_id().is_none() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(token_data.claims)
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = verify(&state.auth, bearer.token())?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Like `customer_auth_middleware`, but lets requests without a token through
/// as guests. A token that is present must still be valid.
pub async fn optional_customer_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(bearer) = req.headers().typed_get::<Authorization<Bearer>>() {
        let claims = verify(&state.auth, bearer.token())?;
        req.extensions_mut().insert(claims);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig { secret: "test-secret".to_string(), expiration: 3600 }
    }

    fn user() -> User {
        User {
            user_id: 42,
            email: "grace@example.com".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            phone: None,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let token = issue_token(&auth(), &user()).unwrap();
        let claims = verify(&auth(), &token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, CUSTOMER_ROLE);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = AuthConfig { secret: "other".to_string(), expiration: 3600 };
        let token = issue_token(&other, &user()).unwrap();
        assert_eq!(verify(&auth(), &token).unwrap_err(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_huge_expiration_does_not_wrap() {
        let now = Utc::now().timestamp() as usize;
        assert!(expires_at(u64::MAX) > now);
        assert!(expires_at(i64::MAX as u64) > now);

        let forever = AuthConfig { secret: "test-secret".to_string(), expiration: u64::MAX };
        let token = issue_token(&forever, &user()).unwrap();
        assert_eq!(verify(&forever, &token).unwrap().user_id(), Some(42));
    }

    #[test]
    fn test_expiry_is_ttl_from_now() {
        let before = Utc::now().timestamp() as usize;
        let exp = expires_at(3600);
        assert!(exp >= before + 3600 && exp <= before + 3601);
    }
}
