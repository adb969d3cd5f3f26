use axum::{
    routing::{get, put},
    Router,
};

use super::handlers::health::{health_check, liveness_check, readiness_check, HealthState};
use super::handlers::medical_case::{
    create_medical_case, delete_medical_case, list_medical_cases, read_medical_case,
    search_medical_cases, update_medical_case, SharedMedicalCaseService,
};
use super::handlers::patient::{
    attach_medical_case, create_patient, delete_patient, detach_medical_case,
    list_patient_medical_cases, list_patients, read_patient, read_patient_by_idp_code,
    search_patients, update_patient, SharedPatientService,
};

pub fn medical_case_routes(service: SharedMedicalCaseService) -> Router {
    Router::new()
        .route(
            "/api/medical-cases",
            get(list_medical_cases)
                .post(create_medical_case)
                .put(update_medical_case),
        )
        .route(
            "/api/medical-cases/:id",
            get(read_medical_case).delete(delete_medical_case),
        )
        .route("/api/_search/medical-cases", get(search_medical_cases))
        .with_state(service)
}

pub fn patient_routes(service: SharedPatientService) -> Router {
    Router::new()
        .route(
            "/api/patients",
            get(list_patients).post(create_patient).put(update_patient),
        )
        .route("/api/patients/:id", get(read_patient).delete(delete_patient))
        .route("/api/patients/idp-code/:idp_code", get(read_patient_by_idp_code))
        .route("/api/patients/:id/medical-cases", get(list_patient_medical_cases))
        .route(
            "/api/patients/:id/medical-cases/:medical_case_id",
            put(attach_medical_case).delete(detach_medical_case),
        )
        .route("/api/_search/patients", get(search_patients))
        .with_state(service)
}

pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/management/health", get(health_check))
        .route("/management/health/liveness", get(liveness_check))
        .route("/management/health/readiness", get(readiness_check))
        .with_state(state)
}
