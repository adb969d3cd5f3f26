use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response},
};
use std::sync::Arc;
use tower::{Layer, Service};

use crate::api::headers::Alert;

/// Renders an [`Alert`] response extension into `X-{application}-*` headers.
/// The extension stays on the response for the access log further out.
#[derive(Clone)]
pub struct AlertLayer {
    application_name: Arc<str>,
}

impl AlertLayer {
    pub fn new(application_name: impl Into<Arc<str>>) -> Self {
        Self {
            application_name: application_name.into(),
        }
    }
}

impl<S> Layer<S> for AlertLayer {
    type Service = AlertService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AlertService {
            inner,
            application_name: self.application_name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AlertService<S> {
    inner: S,
    application_name: Arc<str>,
}

impl<S> Service<Request<Body>> for AlertService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let application_name = self.application_name.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;

            if let Some(alert) = response.extensions().get::<Alert>().cloned() {
                for (name, value) in alert.header_pairs(&application_name) {
                    match (
                        HeaderName::try_from(name.as_str()),
                        HeaderValue::from_str(&value),
                    ) {
                        (Ok(name), Ok(value)) => {
                            response.headers_mut().insert(name, value);
                        }
                        _ => tracing::warn!(header = %name, "Dropping unrepresentable alert header"),
                    }
                }
            }

            Ok(response)
        })
    }
}
