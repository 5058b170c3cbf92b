use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use innohub_types::api::{
    Claims, ProfileResponse, PublicUserResponse, StatusMessage, UpdateProfileRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{parse_timestamp, parse_uuid_lossy};

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse {
        id: parse_uuid_lossy(&user.id, "user"),
        email: user.email,
        display_name: user.display_name,
        domain: user.domain,
        bio: user.bio,
        created_at: parse_timestamp(&user.created_at, "user"),
    }))
}

/// Overwrites the three mutable profile fields. A nonexistent id touches no
/// rows and still answers 200, which the original contract allows.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id != claims.sub {
        return Err(ApiError::Forbidden(
            "Not authorized to update this profile".into(),
        ));
    }

    if req.display_name.trim().is_empty() {
        return Err(ApiError::InvalidInput("Display name is required".into()));
    }

    state.db.update_profile(
        &user_id.to_string(),
        &req.display_name,
        req.domain.as_deref(),
        req.bio.as_deref(),
    )?;

    Ok(Json(StatusMessage {
        message: "Profile updated successfully".into(),
    }))
}

/// Public subset used by the message-composition lookup.
pub async fn get_public_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(PublicUserResponse {
        id: parse_uuid_lossy(&user.id, "user"),
        email: user.email,
        display_name: user.display_name,
        domain: user.domain,
    }))
}
