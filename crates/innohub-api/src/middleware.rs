use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use innohub_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the bearer token, then make the claims available to
/// the handlers. The token subject is the only requester identity the
/// services act on.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization token".into()))?;

    let claims = verify_token(&state.jwt_secret, token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))
}

/// Request bodies still carry the pre-token identity fields (`user_id`,
/// `sender_id`, `userId`). They are accepted for wire compatibility but must
/// agree with the token claims; a mismatch is treated as a forgery attempt.
pub(crate) fn check_claimed_identity(raw: &str, claims: &Claims) -> Result<(), ApiError> {
    if raw.is_empty() {
        return Ok(());
    }

    let claimed: uuid::Uuid = raw
        .parse()
        .map_err(|_| ApiError::InvalidInput("Invalid user id".into()))?;

    if claimed != claims.sub {
        return Err(ApiError::Forbidden(
            "Request identity does not match the authenticated user".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims_for(sub: Uuid) -> Claims {
        Claims {
            sub,
            email: "alice@x.com".into(),
            exp: 4102444800, // 2100-01-01
        }
    }

    #[test]
    fn identity_cross_check() {
        let sub = Uuid::new_v4();
        let claims = claims_for(sub);

        assert!(check_claimed_identity("", &claims).is_ok());
        assert!(check_claimed_identity(&sub.to_string(), &claims).is_ok());

        let other = Uuid::new_v4().to_string();
        assert!(matches!(
            check_claimed_identity(&other, &claims),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            check_claimed_identity("not-a-uuid", &claims),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn garbage_token_rejected() {
        assert!(matches!(
            verify_token("secret", "not.a.token"),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
