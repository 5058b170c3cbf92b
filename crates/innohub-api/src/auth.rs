use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use innohub_db::Database;
use innohub_db::models::CredentialRow;
use innohub_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserPublic,
};

use crate::error::ApiError;
use crate::parse_uuid_lossy;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Email and password are required".into(),
        ));
    }

    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| local_part(&req.email));

    // Hash password with Argon2id
    let password_hash = hash_password(&req.password)?;

    let user_id = Uuid::new_v4();

    // The UNIQUE index on email decides the duplicate case; no pre-check.
    let created = state
        .db
        .create_user(&user_id.to_string(), &req.email, &password_hash, display_name)?;
    if !created {
        return Err(ApiError::Conflict(
            "User already exists with this email".into(),
        ));
    }

    let token = create_token(&state.jwt_secret, user_id, &req.email)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user_id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Email and password are required".into(),
        ));
    }

    let user = authenticate(&state.db, &req.email, &req.password)?;

    let user_id = parse_uuid_lossy(&user.id, "user");
    let token = create_token(&state.jwt_secret, user_id, &user.email)?;

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        user: UserPublic {
            id: user_id,
            email: user.email,
            display_name: user.display_name,
        },
        token,
    }))
}

/// Unknown email and wrong password take the same exit so the response never
/// reveals which one it was.
fn authenticate(db: &Database, email: &str, password: &str) -> Result<CredentialRow, ApiError> {
    let Some(user) = db.get_credentials_by_email(email)? else {
        return Err(invalid_credentials());
    };

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Corrupt password hash: {}", e)))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    Ok(user)
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".into())
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn create_token(secret: &str, user_id: Uuid, email: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token encoding failed: {}", e)))
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::verify_token;

    fn seeded_db() -> (Database, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let id = Uuid::new_v4();
        let hash = hash_password("pw123").unwrap();
        assert!(
            db.create_user(&id.to_string(), "alice@x.com", &hash, "alice")
                .unwrap()
        );
        (db, id)
    }

    fn unauthorized_message(err: ApiError) -> String {
        match err {
            ApiError::Unauthorized(msg) => msg,
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn authenticate_accepts_correct_password() {
        let (db, id) = seeded_db();
        let user = authenticate(&db, "alice@x.com", "pw123").unwrap();
        assert_eq!(user.id, id.to_string());
        assert_eq!(user.display_name, "alice");
    }

    #[test]
    fn bad_password_and_unknown_email_are_indistinguishable() {
        let (db, _) = seeded_db();

        let wrong_password =
            unauthorized_message(authenticate(&db, "alice@x.com", "nope").unwrap_err());
        let unknown_email =
            unauthorized_message(authenticate(&db, "bob@x.com", "pw123").unwrap_err());

        assert_eq!(wrong_password, unknown_email);
    }

    #[test]
    fn token_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = create_token("secret", user_id, "alice@x.com").unwrap();

        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@x.com");

        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn display_name_defaults_to_email_local_part() {
        assert_eq!(local_part("alice@x.com"), "alice");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
    }
}
