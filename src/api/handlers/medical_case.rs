use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::headers::{pagination_headers, search_pagination_headers, Alert};
use crate::error::{ApiError, Result};
use crate::extractors::{ApiJson, ApiPath};
use crate::pagination::Pageable;
use crate::services::medical_case::ENTITY_NAME;
use crate::services::{MedicalCaseDto, MedicalCaseService};

pub type SharedMedicalCaseService = Arc<MedicalCaseService>;

const BASE_URL: &str = "/api/medical-cases";
const SEARCH_URL: &str = "/api/_search/medical-cases";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Create a new medical case; the payload must not carry an id
pub async fn create_medical_case(
    State(service): State<SharedMedicalCaseService>,
    ApiJson(dto): ApiJson<MedicalCaseDto>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Alert, Json<MedicalCaseDto>)> {
    tracing::debug!(?dto, "REST request to save MedicalCase");
    if dto.id.is_some() {
        return Err(ApiError::bad_request_alert(
            "A new medicalCase cannot already have an ID",
            ENTITY_NAME,
            "idexists",
        ));
    }

    let saved = service.save(dto).await?;
    let id = saved.id.ok_or_else(|| anyhow::anyhow!("store returned a medical case without id"))?;
    tracing::info!(id, "Created MedicalCase");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("{}/{}", BASE_URL, id))],
        Alert::created(ENTITY_NAME, id),
        Json(saved),
    ))
}

/// Update an existing medical case; the payload must carry an id
pub async fn update_medical_case(
    State(service): State<SharedMedicalCaseService>,
    ApiJson(dto): ApiJson<MedicalCaseDto>,
) -> Result<(Alert, Json<MedicalCaseDto>)> {
    tracing::debug!(?dto, "REST request to update MedicalCase");
    let Some(id) = dto.id else {
        return Err(ApiError::bad_request_alert("Invalid id", ENTITY_NAME, "idnull"));
    };

    let saved = service.save(dto).await?;
    tracing::info!(id, "Updated MedicalCase");
    Ok((Alert::updated(ENTITY_NAME, id), Json(saved)))
}

pub async fn list_medical_cases(
    State(service): State<SharedMedicalCaseService>,
    pageable: Pageable,
) -> Result<(HeaderMap, Json<Vec<MedicalCaseDto>>)> {
    tracing::debug!(page = pageable.page, size = pageable.size, "REST request to get a page of MedicalCases");
    let page = service.find_all(&pageable).await?;
    let headers = pagination_headers(&page, BASE_URL);
    Ok((headers, Json(page.content)))
}

pub async fn read_medical_case(
    State(service): State<SharedMedicalCaseService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MedicalCaseDto>> {
    tracing::debug!(id, "REST request to get MedicalCase");
    service
        .find_one(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Delete a medical case; answers 200 whether or not it existed
pub async fn delete_medical_case(
    State(service): State<SharedMedicalCaseService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<(Alert, StatusCode)> {
    tracing::debug!(id, "REST request to delete MedicalCase");
    service.delete(id).await?;
    tracing::info!(id, "Deleted MedicalCase");
    Ok((Alert::deleted(ENTITY_NAME, id), StatusCode::OK))
}

pub async fn search_medical_cases(
    State(service): State<SharedMedicalCaseService>,
    Query(params): Query<SearchParams>,
    pageable: Pageable,
) -> Result<(HeaderMap, Json<Vec<MedicalCaseDto>>)> {
    let query = params
        .query
        .ok_or_else(|| ApiError::InvalidRequest("Missing required parameter 'query'".to_string()))?;
    tracing::debug!(query = %query, "REST request to search for a page of MedicalCases");

    let page = service.search(&query, &pageable).await?;
    let headers = search_pagination_headers(&query, &page, SEARCH_URL);
    Ok((headers, Json(page.content)))
}
