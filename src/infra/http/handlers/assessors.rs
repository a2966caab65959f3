//! Assessor handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::query::{FieldPolicy, ListParams, translate};

use super::super::error::{ApiError, source_to_api};
use super::super::state::AppState;

const ASSESSOR_FIELDS: FieldPolicy = FieldPolicy {
    filterable: &["name", "gender", "institution", "regency_id", "created_at"],
    sortable: &["name", "created_at"],
    default_sort: "created_at",
    max_limit: 100,
};

pub async fn list_assessors(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = translate(&params, &ASSESSOR_FIELDS).map_err(ApiError::invalid_filter)?;
    let page = state
        .assessors
        .list(&descriptor)
        .await
        .map_err(source_to_api)?;
    Ok(Json(page))
}

pub async fn get_assessor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assessor = state.assessors.find(id).await.map_err(source_to_api)?;

    match assessor {
        Some(assessor) => Ok(Json(assessor)),
        None => Err(ApiError::not_found("assessor not found")),
    }
}
