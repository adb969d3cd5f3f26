use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use super::medical_case::SearchParams;
use crate::api::headers::{pagination_headers, search_pagination_headers, Alert};
use crate::error::{ApiError, Result};
use crate::extractors::{ApiJson, ApiPath};
use crate::pagination::Pageable;
use crate::services::patient::ENTITY_NAME;
use crate::services::{PatientDto, PatientService};

pub type SharedPatientService = Arc<PatientService>;

const BASE_URL: &str = "/api/patients";
const SEARCH_URL: &str = "/api/_search/patients";

/// Create a new patient
pub async fn create_patient(
    State(service): State<SharedPatientService>,
    ApiJson(dto): ApiJson<PatientDto>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Alert, Json<PatientDto>)> {
    tracing::debug!(idp_code = ?dto.idp_code, "REST request to save Patient");
    if dto.id.is_some() {
        return Err(ApiError::bad_request_alert(
            "A new patient cannot already have an ID",
            ENTITY_NAME,
            "idexists",
        ));
    }

    let saved = service.save(dto).await?;
    let id = saved.id.ok_or_else(|| anyhow::anyhow!("store returned a patient without id"))?;
    tracing::info!(id, "Created Patient");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("{}/{}", BASE_URL, id))],
        Alert::created(ENTITY_NAME, id),
        Json(saved),
    ))
}

/// Update a patient
pub async fn update_patient(
    State(service): State<SharedPatientService>,
    ApiJson(dto): ApiJson<PatientDto>,
) -> Result<(Alert, Json<PatientDto>)> {
    tracing::debug!(id = ?dto.id, "REST request to update Patient");
    let Some(id) = dto.id else {
        return Err(ApiError::bad_request_alert("Invalid id", ENTITY_NAME, "idnull"));
    };

    let saved = service.save(dto).await?;
    tracing::info!(id, "Updated Patient");
    Ok((Alert::updated(ENTITY_NAME, id), Json(saved)))
}

pub async fn list_patients(
    State(service): State<SharedPatientService>,
    pageable: Pageable,
) -> Result<(HeaderMap, Json<Vec<PatientDto>>)> {
    tracing::debug!(page = pageable.page, size = pageable.size, "REST request to get a page of Patients");
    let page = service.find_all(&pageable).await?;
    let headers = pagination_headers(&page, BASE_URL);
    Ok((headers, Json(page.content)))
}

/// Read a patient by ID
pub async fn read_patient(
    State(service): State<SharedPatientService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PatientDto>> {
    tracing::debug!(id, "REST request to get Patient");
    service.find_one(id).await?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn read_patient_by_idp_code(
    State(service): State<SharedPatientService>,
    ApiPath(idp_code): ApiPath<String>,
) -> Result<Json<PatientDto>> {
    tracing::debug!(idp_code = %idp_code, "REST request to get Patient by idpCode");
    service
        .find_by_idp_code(&idp_code)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Delete a patient. Its medical cases stay, detached.
pub async fn delete_patient(
    State(service): State<SharedPatientService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<(Alert, StatusCode)> {
    tracing::debug!(id, "REST request to delete Patient");
    service.delete(id).await?;
    tracing::info!(id, "Deleted Patient");
    Ok((Alert::deleted(ENTITY_NAME, id), StatusCode::OK))
}

pub async fn search_patients(
    State(service): State<SharedPatientService>,
    Query(params): Query<SearchParams>,
    pageable: Pageable,
) -> Result<(HeaderMap, Json<Vec<PatientDto>>)> {
    let query = params
        .query
        .ok_or_else(|| ApiError::InvalidRequest("Missing required parameter 'query'".to_string()))?;
    tracing::debug!(query = %query, "REST request to search for a page of Patients");

    let page = service.search(&query, &pageable).await?;
    let headers = search_pagination_headers(&query, &page, SEARCH_URL);
    Ok((headers, Json(page.content)))
}

pub async fn list_patient_medical_cases(
    State(service): State<SharedPatientService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<i64>>> {
    tracing::debug!(id, "REST request to get MedicalCase ids of Patient");
    Ok(Json(service.medical_case_ids(id).await?))
}

pub async fn attach_medical_case(
    State(service): State<SharedPatientService>,
    ApiPath((id, medical_case_id)): ApiPath<(i64, i64)>,
) -> Result<(Alert, StatusCode)> {
    tracing::debug!(id, medical_case_id, "REST request to attach MedicalCase to Patient");
    service.add_medical_case(id, medical_case_id).await?;
    tracing::info!(id, medical_case_id, "Attached MedicalCase");
    Ok((Alert::updated(ENTITY_NAME, id), StatusCode::OK))
}

pub async fn detach_medical_case(
    State(service): State<SharedPatientService>,
    ApiPath((id, medical_case_id)): ApiPath<(i64, i64)>,
) -> Result<(Alert, StatusCode)> {
    tracing::debug!(id, medical_case_id, "REST request to detach MedicalCase from Patient");
    service.remove_medical_case(id, medical_case_id).await?;
    tracing::info!(id, medical_case_id, "Detached MedicalCase");
    Ok((Alert::updated(ENTITY_NAME, id), StatusCode::OK))
}
