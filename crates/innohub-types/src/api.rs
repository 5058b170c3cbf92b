use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::IdeaStage;

// -- JWT Claims --

/// JWT claims shared between token issuance (auth handlers) and the bearer
/// middleware. Canonical definition lives here in innohub-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

/// Identity fields in request bodies default to empty strings rather than
/// failing deserialization, so that missing fields surface as a 400 from the
/// handlers' presence checks instead of a deserializer rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserPublic,
    pub token: String,
}

/// Public user fields returned at login. The password hash never leaves the
/// auth handlers.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

// -- Ideas --

/// Shared body for POST /ideas and PUT /ideas/{id}. `user_id` is the legacy
/// client-supplied identity; it is cross-checked against the bearer token
/// claims, never trusted on its own.
#[derive(Debug, Deserialize)]
pub struct IdeaRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub stage: String,
    pub funding_amount: Option<f64>,
}

/// Legacy body for DELETE /ideas/{id}; the identity is cross-checked
/// against the token like everywhere else. Clients may omit the body
/// entirely.
#[derive(Debug, Deserialize)]
pub struct DeleteIdeaRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaCreatedResponse {
    pub message: String,
    pub idea_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct IdeaResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub domain: String,
    pub problem: String,
    pub solution: String,
    pub stage: IdeaStage,
    pub funding_amount: f64,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_ideas: i64,
    pub total_messages: i64,
    pub recent_ideas: Vec<RecentIdea>,
}

/// Dashboard entries carry the owner display name but not the email.
#[derive(Debug, Serialize)]
pub struct RecentIdea {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub domain: String,
    pub problem: String,
    pub solution: String,
    pub stage: IdeaStage,
    pub funding_amount: f64,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub receiver_id: String,
    #[serde(default)]
    pub idea_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSentResponse {
    pub message: String,
    pub message_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct InboxMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub idea_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub sender_name: String,
    pub sender_email: String,
    pub idea_title: String,
    pub idea_domain: String,
}

#[derive(Debug, Serialize)]
pub struct SentMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub idea_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub receiver_name: String,
    pub receiver_email: String,
    pub idea_title: String,
    pub idea_domain: String,
}

/// Thread view for a single idea: both participants' names, chronological
/// order.
#[derive(Debug, Serialize)]
pub struct ThreadMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub idea_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub sender_name: String,
    pub receiver_name: String,
    pub idea_title: String,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub domain: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: String,
    pub domain: Option<String>,
    pub bio: Option<String>,
}

/// Subset used by the message-composition lookup.
#[derive(Debug, Serialize)]
pub struct PublicUserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub domain: Option<String>,
}

// -- Shared --

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}
