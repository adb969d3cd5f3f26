pub mod dto;
pub mod medical_case;
pub mod patient;

pub use dto::{MedicalCaseDto, PatientDto};
pub use medical_case::MedicalCaseService;
pub use patient::PatientService;
