//! Alert and pagination response headers.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use std::convert::Infallible;

use crate::pagination::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertKind {
    Created,
    Updated,
    Deleted,
    Failure { error_key: String },
}

/// Client-UI notification attached to a response.
///
/// Handlers and errors only record the alert; `AlertLayer` renders it into
/// `X-{application}-*` headers because only the layer knows the application name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub entity_name: String,
    pub param: String,
}

impl Alert {
    pub fn created(entity_name: &str, param: impl ToString) -> Self {
        Self::new(AlertKind::Created, entity_name, param)
    }

    pub fn updated(entity_name: &str, param: impl ToString) -> Self {
        Self::new(AlertKind::Updated, entity_name, param)
    }

    pub fn deleted(entity_name: &str, param: impl ToString) -> Self {
        Self::new(AlertKind::Deleted, entity_name, param)
    }

    pub fn failure(entity_name: impl Into<String>, error_key: impl Into<String>) -> Self {
        let entity_name = entity_name.into();
        Self {
            kind: AlertKind::Failure {
                error_key: error_key.into(),
            },
            param: entity_name.clone(),
            entity_name,
        }
    }

    fn new(kind: AlertKind, entity_name: &str, param: impl ToString) -> Self {
        Self {
            kind,
            entity_name: entity_name.to_string(),
            param: param.to_string(),
        }
    }

    /// `created`, `updated`, `deleted`, or the error key of a failure.
    pub fn outcome(&self) -> &str {
        match &self.kind {
            AlertKind::Created => "created",
            AlertKind::Updated => "updated",
            AlertKind::Deleted => "deleted",
            AlertKind::Failure { error_key } => error_key,
        }
    }

    /// Header name/value pairs for `application`.
    pub fn header_pairs(&self, application: &str) -> Vec<(String, String)> {
        let (suffix, message) = match &self.kind {
            AlertKind::Created => ("alert", format!("{}.{}.created", application, self.entity_name)),
            AlertKind::Updated => ("alert", format!("{}.{}.updated", application, self.entity_name)),
            AlertKind::Deleted => ("alert", format!("{}.{}.deleted", application, self.entity_name)),
            AlertKind::Failure { error_key } => ("error", format!("error.{}", error_key)),
        };

        vec![
            (format!("X-{}-{}", application, suffix), message),
            (format!("X-{}-params", application), self.param.clone()),
        ]
    }
}

impl IntoResponseParts for Alert {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// `X-Total-Count` plus a `Link` header with next/prev/last/first relations.
pub fn pagination_headers<T>(page: &Page<T>, base_url: &str) -> HeaderMap {
    build_pagination_headers(page, base_url, None)
}

/// As [`pagination_headers`], with the url-encoded query carried on every link.
pub fn search_pagination_headers<T>(query: &str, page: &Page<T>, base_url: &str) -> HeaderMap {
    let escaped: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    build_pagination_headers(page, base_url, Some(escaped))
}

fn build_pagination_headers<T>(page: &Page<T>, base_url: &str, query: Option<String>) -> HeaderMap {
    let uri = |number: u64| match &query {
        Some(q) => format!("{}?page={}&size={}&query={}", base_url, number, page.size, q),
        None => format!("{}?page={}&size={}", base_url, number, page.size),
    };

    let number = page.number as u64;
    let total_pages = page.total_pages();
    let mut links = Vec::with_capacity(4);

    if number + 1 < total_pages {
        links.push(format!("<{}>; rel=\"next\"", uri(number + 1)));
    }
    if number > 0 {
        links.push(format!("<{}>; rel=\"prev\"", uri(number - 1)));
    }
    links.push(format!("<{}>; rel=\"last\"", uri(total_pages.saturating_sub(1))));
    links.push(format!("<{}>; rel=\"first\"", uri(0)));

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-total-count"),
        HeaderValue::from(page.total_elements),
    );
    match HeaderValue::from_str(&links.join(",")) {
        Ok(value) => {
            headers.insert(header::LINK, value);
        }
        Err(e) => tracing::warn!(error = %e, "Skipping unrepresentable Link header"),
    }
    headers
}
