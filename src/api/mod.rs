pub mod handlers;
pub mod headers;
pub mod routes;

use axum::Router;
use std::sync::Arc;

use crate::middleware::{AlertLayer, LoggingLayer, RequestIdLayer};
use crate::models::Patient;
use crate::repository::PatientStore;
use crate::search::SearchIndex;
use crate::services::{MedicalCaseService, PatientService};

pub use handlers::health::HealthState;
pub use routes::{health_routes, medical_case_routes, patient_routes};

/// Everything the HTTP layer needs, wired once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub medical_cases: Arc<MedicalCaseService>,
    pub patients: Arc<PatientService>,
    pub patient_store: Arc<dyn PatientStore>,
    pub patient_index: Arc<dyn SearchIndex<Patient>>,
}

/// Full application router with alert rendering, request ids and access logging.
pub fn app(services: AppServices, application_name: &str) -> Router {
    let health = HealthState {
        store: services.patient_store,
        index: services.patient_index,
    };

    Router::new()
        .merge(medical_case_routes(services.medical_cases))
        .merge(patient_routes(services.patients))
        .merge(health_routes(health))
        .layer(AlertLayer::new(application_name))
        .layer(LoggingLayer)
        .layer(RequestIdLayer)
}
