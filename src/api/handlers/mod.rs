pub mod health;
pub mod medical_case;
pub mod patient;
