use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use std::convert::Infallible;

use crate::error::ApiError;
use crate::pagination::Pageable;

/// JSON body extractor whose rejections are problem responses instead of plain text.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(match rejection {
                JsonRejection::JsonDataError(err) => {
                    ApiError::InvalidRequest(format!("Invalid JSON data: {}", err.body_text()))
                }
                JsonRejection::JsonSyntaxError(err) => ApiError::InvalidRequest(format!(
                    "Failed to parse the request body as JSON: {}",
                    err.body_text()
                )),
                JsonRejection::MissingJsonContentType(err) => {
                    ApiError::UnsupportedMediaType(err.body_text())
                }
                other => ApiError::InvalidRequest(other.body_text()),
            }),
        }
    }
}

/// Path parameter extractor; an id that does not parse is a 400 problem
/// response rather than axum's plain-text rejection.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => Err(ApiError::InvalidRequest(
                format!("Invalid path parameter: {}", err.body_text()),
            )),
            // Route and extractor disagree; not the caller's fault
            Err(other) => Err(ApiError::Internal(anyhow::anyhow!(other.body_text()))),
        }
    }
}

/// `page`, `size` and repeated `sort` query parameters.
///
/// Never rejects: malformed values fall back to defaults, and unknown sort
/// properties are reported later when the sort is resolved for an entity.
#[async_trait]
impl<S> FromRequestParts<S> for Pageable
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs: Vec<(String, String)> = parts
            .uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Ok(Pageable::from_pairs(&pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::SortDirection;
    use axum::{body::Body, http::Request as HttpRequest};

    async fn pageable_for(uri: &str) -> Pageable {
        let (mut parts, _) = HttpRequest::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
            .into_parts();
        Pageable::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_pageable_from_query() {
        let pageable = pageable_for("/api/patients?page=2&size=5&sort=location,desc&sort=id").await;

        assert_eq!(pageable.page, 2);
        assert_eq!(pageable.size, 5);
        assert_eq!(pageable.sort.len(), 2);
        assert_eq!(pageable.sort[0].property, "location");
        assert_eq!(pageable.sort[0].direction, SortDirection::Descending);
    }

    #[tokio::test]
    async fn test_pageable_without_query_is_default() {
        assert_eq!(pageable_for("/api/patients").await, Pageable::default());
    }

    #[tokio::test]
    async fn test_path_outside_a_route_is_internal() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/api/medical-cases/1")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let result = ApiPath::<i64>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_request() {
        let req = HttpRequest::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let result = ApiJson::<serde_json::Value>::from_request(req, &()).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_unsupported() {
        let req = HttpRequest::builder()
            .method("POST")
            .body(Body::from("{}"))
            .unwrap();

        let result = ApiJson::<serde_json::Value>::from_request(req, &()).await;
        assert!(matches!(result, Err(ApiError::UnsupportedMediaType(_))));
    }
}
