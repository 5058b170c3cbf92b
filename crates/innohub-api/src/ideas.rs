use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use innohub_db::models::{IdeaFields, IdeaRow};
use innohub_types::api::{
    Claims, DashboardResponse, DeleteIdeaRequest, IdeaCreatedResponse, IdeaRequest, IdeaResponse,
    RecentIdea, StatusMessage,
};
use innohub_types::models::IdeaStage;

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::middleware::check_claimed_identity;
use crate::{parse_timestamp, parse_uuid_lossy};

/// The dashboard shows this many of the user's newest ideas.
const RECENT_IDEAS: u32 = 5;

pub async fn create_idea(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<IdeaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_claimed_identity(&req.user_id, &claims)?;
    let (stage, funding_amount) = validate_idea_fields(&req)?;

    let idea_id = Uuid::new_v4();

    state.db.insert_idea(
        &idea_id.to_string(),
        &claims.sub.to_string(),
        &IdeaFields {
            title: &req.title,
            domain: &req.domain,
            problem: &req.problem,
            solution: &req.solution,
            stage: stage.as_str(),
            funding_amount,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(IdeaCreatedResponse {
            message: "Idea created successfully".into(),
            idea_id,
        }),
    ))
}

pub async fn get_all_ideas(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Run the blocking DB query off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_ideas())
        .await
        .map_err(join_error)??;

    let ideas: Vec<IdeaResponse> = rows.into_iter().map(idea_response).collect();
    Ok(Json(ideas))
}

pub async fn get_ideas_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_ideas_by_user(&user_id.to_string()))
        .await
        .map_err(join_error)??;

    let ideas: Vec<IdeaResponse> = rows.into_iter().map(idea_response).collect();
    Ok(Json(ideas))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id != claims.sub {
        return Err(ApiError::Forbidden(
            "Not authorized to view this dashboard".into(),
        ));
    }

    let db = state.clone();
    let (total_ideas, total_messages, recent) =
        tokio::task::spawn_blocking(move || db.db.dashboard(&user_id.to_string(), RECENT_IDEAS))
            .await
            .map_err(join_error)??;

    Ok(Json(DashboardResponse {
        total_ideas,
        total_messages,
        recent_ideas: recent.into_iter().map(recent_idea).collect(),
    }))
}

pub async fn get_idea(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_idea(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Idea not found".into()))?;

    Ok(Json(idea_response(row)))
}

pub async fn update_idea(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<IdeaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_claimed_identity(&req.user_id, &claims)?;
    let (stage, funding_amount) = validate_idea_fields(&req)?;

    let rows = state.db.update_idea(
        &id.to_string(),
        &claims.sub.to_string(),
        &IdeaFields {
            title: &req.title,
            domain: &req.domain,
            problem: &req.problem,
            solution: &req.solution,
            stage: stage.as_str(),
            funding_amount,
        },
    )?;

    if rows == 0 {
        return Err(mutation_refused(&state, &id, "update"));
    }

    Ok(Json(StatusMessage {
        message: "Idea updated successfully".into(),
    }))
}

/// The legacy body carries `user_id`; newer clients send no body at all, so
/// the raw bytes are inspected instead of a mandatory JSON extractor.
pub async fn delete_idea(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if !body.is_empty() {
        let req: DeleteIdeaRequest = serde_json::from_slice(&body)
            .map_err(|_| ApiError::InvalidInput("Invalid request body".into()))?;
        check_claimed_identity(&req.user_id, &claims)?;
    }

    let rows = state.db.delete_idea(&id.to_string(), &claims.sub.to_string())?;

    if rows == 0 {
        return Err(mutation_refused(&state, &id, "delete"));
    }

    Ok(Json(StatusMessage {
        message: "Idea deleted successfully".into(),
    }))
}

/// The conditional write touched no rows: decide between a missing idea and
/// a foreign owner. The probe runs after the write, so a lost race reports
/// the state that actually won.
fn mutation_refused(state: &AppState, id: &Uuid, action: &str) -> ApiError {
    match state.db.get_idea_owner(&id.to_string()) {
        Ok(None) => ApiError::NotFound("Idea not found".into()),
        Ok(Some(_)) => ApiError::Forbidden(format!("Not authorized to {action} this idea")),
        Err(e) => ApiError::Internal(e),
    }
}

fn validate_idea_fields(req: &IdeaRequest) -> Result<(IdeaStage, f64), ApiError> {
    let required = [
        &req.title,
        &req.domain,
        &req.problem,
        &req.solution,
        &req.stage,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(ApiError::InvalidInput("All fields are required".into()));
    }

    let stage = IdeaStage::parse(&req.stage)
        .ok_or_else(|| ApiError::InvalidInput("Invalid idea stage".into()))?;

    let funding_amount = req.funding_amount.unwrap_or(0.0);
    if !funding_amount.is_finite() || funding_amount < 0.0 {
        return Err(ApiError::InvalidInput(
            "Funding amount must be non-negative".into(),
        ));
    }

    Ok((stage, funding_amount))
}

fn idea_response(row: IdeaRow) -> IdeaResponse {
    IdeaResponse {
        id: parse_uuid_lossy(&row.id, "idea"),
        user_id: parse_uuid_lossy(&row.user_id, "idea owner"),
        title: row.title,
        domain: row.domain,
        problem: row.problem,
        solution: row.solution,
        stage: parse_stage(&row.stage, &row.id),
        funding_amount: row.funding_amount,
        created_at: parse_timestamp(&row.created_at, "idea"),
        display_name: row.owner_name,
        email: row.owner_email,
    }
}

fn recent_idea(row: IdeaRow) -> RecentIdea {
    RecentIdea {
        id: parse_uuid_lossy(&row.id, "idea"),
        user_id: parse_uuid_lossy(&row.user_id, "idea owner"),
        title: row.title,
        domain: row.domain,
        problem: row.problem,
        solution: row.solution,
        stage: parse_stage(&row.stage, &row.id),
        funding_amount: row.funding_amount,
        created_at: parse_timestamp(&row.created_at, "idea"),
        display_name: row.owner_name,
    }
}

fn parse_stage(raw: &str, idea_id: &str) -> IdeaStage {
    IdeaStage::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt stage '{}' on idea '{}'", raw, idea_id);
        IdeaStage::Idea
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> IdeaRequest {
        IdeaRequest {
            user_id: String::new(),
            title: "X".into(),
            domain: "EdTech".into(),
            problem: "P".into(),
            solution: "S".into(),
            stage: "Idea".into(),
            funding_amount: None,
        }
    }

    #[test]
    fn funding_defaults_to_zero() {
        let (stage, funding) = validate_idea_fields(&valid_request()).unwrap();
        assert_eq!(stage, IdeaStage::Idea);
        assert_eq!(funding, 0.0);
    }

    #[test]
    fn blank_fields_rejected() {
        for blank in ["title", "domain", "problem", "solution", "stage"] {
            let mut req = valid_request();
            match blank {
                "title" => req.title = "  ".into(),
                "domain" => req.domain = String::new(),
                "problem" => req.problem = String::new(),
                "solution" => req.solution = String::new(),
                _ => req.stage = String::new(),
            }
            assert!(
                matches!(validate_idea_fields(&req), Err(ApiError::InvalidInput(_))),
                "blank {blank} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_stage_rejected() {
        let mut req = valid_request();
        req.stage = "Prototype".into();
        assert!(matches!(
            validate_idea_fields(&req),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn negative_funding_rejected() {
        let mut req = valid_request();
        req.funding_amount = Some(-1.0);
        assert!(matches!(
            validate_idea_fields(&req),
            Err(ApiError::InvalidInput(_))
        ));

        req.funding_amount = Some(f64::NAN);
        assert!(matches!(
            validate_idea_fields(&req),
            Err(ApiError::InvalidInput(_))
        ));

        req.funding_amount = Some(50_000.0);
        let (_, funding) = validate_idea_fields(&req).unwrap();
        assert_eq!(funding, 50_000.0);
    }
}
