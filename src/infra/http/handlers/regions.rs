//! Reference geography handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;

use crate::application::query::{FieldPolicy, ListParams, translate, translate_unpaged};

use super::super::error::{ApiError, source_to_api};
use super::super::state::AppState;

const PROVINCE_FIELDS: FieldPolicy = FieldPolicy {
    filterable: &["code", "name"],
    sortable: &["code", "name"],
    default_sort: "code",
    max_limit: 200,
};

const REGENCY_FIELDS: FieldPolicy = FieldPolicy {
    filterable: &["province_id", "code", "name"],
    sortable: &["code", "name"],
    default_sort: "code",
    max_limit: 200,
};

/// Every province, unsliced; the dropdown consumer needs the full set.
pub async fn list_provinces(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor =
        translate_unpaged(Vec::new(), &PROVINCE_FIELDS).map_err(ApiError::invalid_filter)?;
    let page = state
        .regions
        .provinces(&descriptor)
        .await
        .map_err(source_to_api)?;
    Ok(Json(page))
}

pub async fn list_regencies(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let descriptor = translate(&params, &REGENCY_FIELDS).map_err(ApiError::invalid_filter)?;
    let page = state
        .regions
        .regencies(&descriptor)
        .await
        .map_err(source_to_api)?;
    Ok(Json(page))
}
