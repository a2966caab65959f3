//! Participant handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::application::query::{FieldPolicy, FilterPredicate, ListParams, translate};
use crate::application::sources::NewParticipant;
use crate::domain::types::{AssessmentStatus, Gender};

use super::super::error::{ApiError, source_to_api};
use super::super::state::AppState;

const PARTICIPANT_FIELDS: FieldPolicy = FieldPolicy {
    filterable: &[
        "name",
        "gender",
        "status",
        "assessor_id",
        "regency_id",
        "juz_memorized",
        "created_at",
    ],
    sortable: &["name", "juz_memorized", "created_at"],
    default_sort: "created_at",
    max_limit: 100,
};

#[derive(Debug, Deserialize)]
pub struct ParticipantListQuery {
    #[serde(flatten)]
    pub list: ListParams,
    /// Shortcut for an equality filter on assessment status.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantCreateRequest {
    pub name: String,
    pub gender: Gender,
    #[serde(default = "default_status")]
    pub status: AssessmentStatus,
    pub regency_id: Uuid,
    #[serde(default)]
    pub juz_memorized: i32,
}

fn default_status() -> AssessmentStatus {
    AssessmentStatus::Belum
}

pub async fn list_participants(
    State(state): State<AppState>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut descriptor =
        translate(&query.list, &PARTICIPANT_FIELDS).map_err(ApiError::invalid_filter)?;
    if let Some(status) = query.status {
        descriptor = descriptor.with_clause("status", FilterPredicate::Eq(Value::String(status)));
    }

    let page = state
        .participants
        .list(&descriptor)
        .await
        .map_err(source_to_api)?;
    Ok(Json(page))
}

pub async fn get_participant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = state
        .participants
        .find(id)
        .await
        .map_err(source_to_api)?;

    match participant {
        Some(participant) => Ok(Json(participant)),
        None => Err(ApiError::not_found("participant not found")),
    }
}

/// Participants with no assessor assigned. Never cached: the view tracks
/// mutable assignment state.
pub async fn list_unassessed(
    State(state): State<AppState>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor =
        translate(&query.list, &PARTICIPANT_FIELDS).map_err(ApiError::invalid_filter)?;
    let page = state
        .participants
        .unassessed(&descriptor)
        .await
        .map_err(source_to_api)?;
    Ok(Json(page))
}

/// Participants assigned an assessor but not yet assessed. Never cached.
pub async fn list_ready(
    State(state): State<AppState>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor =
        translate(&query.list, &PARTICIPANT_FIELDS).map_err(ApiError::invalid_filter)?;
    let page = state
        .participants
        .ready(&descriptor)
        .await
        .map_err(source_to_api)?;
    Ok(Json(page))
}

pub async fn create_participant(
    State(state): State<AppState>,
    Json(payload): Json<ParticipantCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewParticipant {
        name: payload.name,
        gender: payload.gender,
        status: payload.status,
        regency_id: payload.regency_id,
        juz_memorized: payload.juz_memorized,
    };

    let participant = state
        .participants
        .create(new)
        .await
        .map_err(source_to_api)?;

    Ok((StatusCode::CREATED, Json(participant)))
}
