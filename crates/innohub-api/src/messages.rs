use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use innohub_db::models::MessageRow;
use innohub_types::api::{
    Claims, InboxMessage, MessageSentResponse, SendMessageRequest, SentMessage, ThreadMessage,
};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::middleware::check_claimed_identity;
use crate::{parse_timestamp, parse_uuid_lossy};

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    /// Legacy identity parameter; cross-checked against the token claims.
    #[serde(rename = "userId", default)]
    pub user_id: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_claimed_identity(&req.sender_id, &claims)?;

    if req.receiver_id.trim().is_empty()
        || req.idea_id.trim().is_empty()
        || req.message.trim().is_empty()
    {
        return Err(ApiError::InvalidInput("All fields are required".into()));
    }

    let receiver_id: Uuid = req
        .receiver_id
        .parse()
        .map_err(|_| ApiError::InvalidInput("Invalid receiver or idea id".into()))?;
    let idea_id: Uuid = req
        .idea_id
        .parse()
        .map_err(|_| ApiError::InvalidInput("Invalid receiver or idea id".into()))?;

    let message_id = Uuid::new_v4();

    // Foreign keys are the existence check; a violation comes back as false.
    let inserted = state.db.insert_message(
        &message_id.to_string(),
        &claims.sub.to_string(),
        &receiver_id.to_string(),
        &idea_id.to_string(),
        &req.message,
    )?;
    if !inserted {
        return Err(ApiError::InvalidInput("Unknown receiver or idea".into()));
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageSentResponse {
            message: "Message sent successfully".into(),
            message_id,
        }),
    ))
}

pub async fn get_inbox(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_self(user_id, &claims)?;

    // Run the blocking DB query off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.inbox_messages(&user_id.to_string()))
        .await
        .map_err(join_error)??;

    let messages: Vec<InboxMessage> = rows.into_iter().map(inbox_message).collect();
    Ok(Json(messages))
}

pub async fn get_sent(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_self(user_id, &claims)?;

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.sent_messages(&user_id.to_string()))
        .await
        .map_err(join_error)??;

    let messages: Vec<SentMessage> = rows.into_iter().map(sent_message).collect();
    Ok(Json(messages))
}

pub async fn get_idea_thread(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Query(query): Query<ThreadQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    check_claimed_identity(&query.user_id, &claims)?;

    let db = state.clone();
    let user_id = claims.sub.to_string();
    let rows =
        tokio::task::spawn_blocking(move || db.db.idea_thread(&idea_id.to_string(), &user_id))
            .await
            .map_err(join_error)??;

    let messages: Vec<ThreadMessage> = rows.into_iter().map(thread_message).collect();
    Ok(Json(messages))
}

/// Inbox and sent views are private to the user they belong to.
fn require_self(user_id: Uuid, claims: &Claims) -> Result<(), ApiError> {
    if user_id != claims.sub {
        return Err(ApiError::Forbidden(
            "Not authorized to view these messages".into(),
        ));
    }
    Ok(())
}

fn inbox_message(row: MessageRow) -> InboxMessage {
    InboxMessage {
        id: parse_uuid_lossy(&row.id, "message"),
        sender_id: parse_uuid_lossy(&row.sender_id, "message sender"),
        receiver_id: parse_uuid_lossy(&row.receiver_id, "message receiver"),
        idea_id: parse_uuid_lossy(&row.idea_id, "message idea"),
        message: row.body,
        created_at: parse_timestamp(&row.created_at, "message"),
        sender_name: row.sender_name,
        sender_email: row.sender_email,
        idea_title: row.idea_title,
        idea_domain: row.idea_domain,
    }
}

fn sent_message(row: MessageRow) -> SentMessage {
    SentMessage {
        id: parse_uuid_lossy(&row.id, "message"),
        sender_id: parse_uuid_lossy(&row.sender_id, "message sender"),
        receiver_id: parse_uuid_lossy(&row.receiver_id, "message receiver"),
        idea_id: parse_uuid_lossy(&row.idea_id, "message idea"),
        message: row.body,
        created_at: parse_timestamp(&row.created_at, "message"),
        receiver_name: row.receiver_name,
        receiver_email: row.receiver_email,
        idea_title: row.idea_title,
        idea_domain: row.idea_domain,
    }
}

fn thread_message(row: MessageRow) -> ThreadMessage {
    ThreadMessage {
        id: parse_uuid_lossy(&row.id, "message"),
        sender_id: parse_uuid_lossy(&row.sender_id, "message sender"),
        receiver_id: parse_uuid_lossy(&row.receiver_id, "message receiver"),
        idea_id: parse_uuid_lossy(&row.idea_id, "message idea"),
        message: row.body,
        created_at: parse_timestamp(&row.created_at, "message"),
        sender_name: row.sender_name,
        receiver_name: row.receiver_name,
        idea_title: row.idea_title,
    }
}
