//! Jury session API handlers
//!
//! GET/POST /hackathons/:hackathon_id/jury, GET /jury/:session_id[/progress|/live|/results],
//! POST /jury/:session_id/layers/:layer, POST /jury/:session_id/reset

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hjury_common::Error as CommonError;

use crate::api::auth::Owner;
use crate::error::{ApiError, ApiResult};
use crate::models::{EvaluationSession, FinalResults};
use crate::services::{
    LayerExecutionSummary, SessionProgress, SessionProgressSummary, SessionWithResults,
};
use crate::AppState;

/// POST /hackathons/:hackathon_id/jury request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub eligibility_criteria: serde_json::Value,
}

/// GET /hackathons/:hackathon_id/jury response
#[derive(Debug, Serialize)]
pub struct HackathonSessionResponse {
    pub session: Option<SessionWithResults>,
}

/// GET /hackathons/:hackathon_id/jury
pub async fn get_session_by_hackathon(
    State(state): State<AppState>,
    owner: Owner,
    Path(hackathon_id): Path<Uuid>,
) -> ApiResult<Json<HackathonSessionResponse>> {
    let session = state
        .sessions
        .get_session_by_hackathon(hackathon_id, owner.as_str())
        .await?;
    Ok(Json(HackathonSessionResponse { session }))
}

/// POST /hackathons/:hackathon_id/jury
///
/// Returns 201 with the new PENDING session, 409 if one is already active.
pub async fn create_session(
    State(state): State<AppState>,
    owner: Owner,
    Path(hackathon_id): Path<Uuid>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<EvaluationSession>)> {
    let session = state
        .sessions
        .create_session(hackathon_id, owner.as_str(), request.eligibility_criteria)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /jury/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    owner: Owner,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionWithResults>> {
    Ok(Json(
        state.sessions.get_session(session_id, owner.as_str()).await?,
    ))
}

/// GET /jury/:session_id/progress
pub async fn get_progress(
    State(state): State<AppState>,
    owner: Owner,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionProgressSummary>> {
    Ok(Json(
        state.sessions.get_progress(session_id, owner.as_str()).await?,
    ))
}

/// GET /jury/:session_id/live
pub async fn get_live_progress(
    State(state): State<AppState>,
    owner: Owner,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionProgress>> {
    Ok(Json(
        state
            .sessions
            .get_live_progress(session_id, owner.as_str())
            .await?,
    ))
}

/// GET /jury/:session_id/results
pub async fn get_results(
    State(state): State<AppState>,
    owner: Owner,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<FinalResults>> {
    Ok(Json(
        state.sessions.get_results(session_id, owner.as_str()).await?,
    ))
}

/// POST /jury/:session_id/layers/:layer
///
/// Runs the layer to completion before responding.
pub async fn execute_layer(
    State(state): State<AppState>,
    owner: Owner,
    Path((session_id, layer)): Path<(Uuid, String)>,
) -> ApiResult<Json<LayerExecutionSummary>> {
    let layer: u8 = layer
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid layer number: {}", layer)))?;

    match state
        .orchestrator
        .execute_layer(session_id, layer, owner.as_str())
        .await
    {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            if matches!(e, CommonError::Database(_) | CommonError::Internal(_)) {
                *state.last_error.write().await = Some(e.to_string());
            }
            Err(e.into())
        }
    }
}

/// POST /jury/:session_id/reset
pub async fn reset_session(
    State(state): State<AppState>,
    owner: Owner,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<EvaluationSession>> {
    Ok(Json(
        state
            .sessions
            .reset_session(session_id, owner.as_str())
            .await?,
    ))
}

/// Build jury routes
pub fn jury_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/hackathons/:hackathon_id/jury",
            get(get_session_by_hackathon).post(create_session),
        )
        .route("/jury/:session_id", get(get_session))
        .route("/jury/:session_id/progress", get(get_progress))
        .route("/jury/:session_id/live", get(get_live_progress))
        .route("/jury/:session_id/results", get(get_results))
        .route("/jury/:session_id/layers/:layer", post(execute_layer))
        .route("/jury/:session_id/reset", post(reset_session))
}
