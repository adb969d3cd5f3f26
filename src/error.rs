use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::headers::Alert;
use crate::client::DmsError;

const PROBLEM_BASE_URL: &str = "https://www.jhipster.tech/problem";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client error that the UI localises through `entityName` + `errorKey`.
    #[error("{title}")]
    BadRequestAlert {
        title: String,
        entity_name: String,
        error_key: String,
    },

    #[error("Resource not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A unique column rejected the write; carries the JSON property name.
    #[error("Duplicate value for {0}")]
    DuplicateValue(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Search index error: {0}")]
    SearchIndex(String),

    #[error("Document service error: {0}")]
    DocumentService(#[from] DmsError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request_alert(
        title: impl Into<String>,
        entity_name: impl Into<String>,
        error_key: impl Into<String>,
    ) -> Self {
        ApiError::BadRequestAlert {
            title: title.into(),
            entity_name: entity_name.into(),
            error_key: error_key.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadRequestAlert {
                title,
                entity_name,
                error_key,
            } => {
                let body = json!({
                    "type": format!("{}/problem-with-message", PROBLEM_BASE_URL),
                    "title": title,
                    "status": StatusCode::BAD_REQUEST.as_u16(),
                    "entityName": entity_name,
                    "errorKey": error_key,
                    "message": format!("error.{}", error_key),
                    "params": entity_name,
                });
                let alert = Alert::failure(entity_name, error_key);
                problem_response(StatusCode::BAD_REQUEST, body, Some(alert))
            }
            ApiError::InvalidRequest(detail) => {
                let body = json!({
                    "type": format!("{}/problem-with-message", PROBLEM_BASE_URL),
                    "title": "Bad Request",
                    "status": StatusCode::BAD_REQUEST.as_u16(),
                    "detail": detail,
                    "message": "error.http.400",
                });
                problem_response(StatusCode::BAD_REQUEST, body, None)
            }
            ApiError::DuplicateValue(field) => {
                let body = json!({
                    "type": format!("{}/problem-with-message", PROBLEM_BASE_URL),
                    "title": "Bad Request",
                    "status": StatusCode::BAD_REQUEST.as_u16(),
                    "detail": format!("{} is already in use", field),
                    "message": "error.http.400",
                });
                problem_response(StatusCode::BAD_REQUEST, body, None)
            }
            ApiError::UnsupportedMediaType(detail) => {
                let body = json!({
                    "type": format!("{}/problem-with-message", PROBLEM_BASE_URL),
                    "title": "Unsupported Media Type",
                    "status": StatusCode::UNSUPPORTED_MEDIA_TYPE.as_u16(),
                    "detail": detail,
                    "message": "error.http.415",
                });
                problem_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, body, None)
            }
            ApiError::DatabaseError(ref e) => {
                tracing::error!(error = %e, "Database error");
                internal_problem()
            }
            ApiError::SearchIndex(ref e) => {
                tracing::error!(error = %e, "Search index error");
                internal_problem()
            }
            ApiError::DocumentService(ref e) => {
                tracing::error!(error = %e, "Document service error");
                internal_problem()
            }
            ApiError::Internal(ref e) => {
                tracing::error!(error = %e, "Internal error");
                internal_problem()
            }
        }
    }
}

fn internal_problem() -> Response {
    let body = json!({
        "type": format!("{}/problem-with-message", PROBLEM_BASE_URL),
        "title": "Internal Server Error",
        "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        "message": "error.http.500",
    });
    problem_response(StatusCode::INTERNAL_SERVER_ERROR, body, None)
}

fn problem_response(status: StatusCode, body: serde_json::Value, alert: Option<Alert>) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );
    if let Some(alert) = alert {
        response.extensions_mut().insert(alert);
    }
    response
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_has_empty_body_status() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_bad_request_alert_carries_failure_alert() {
        let response =
            ApiError::bad_request_alert("Invalid id", "patientServiceMedicalCase", "idnull")
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );
        let alert = response.extensions().get::<Alert>().expect("alert extension");
        assert_eq!(alert.entity_name, "patientServiceMedicalCase");
    }

    #[test]
    fn test_duplicate_value_is_bad_request() {
        let response = ApiError::DuplicateValue("idpCode".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<Alert>().is_none());
    }

    #[test]
    fn test_database_error_is_internal() {
        let response = ApiError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
