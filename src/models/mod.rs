pub mod binary;
pub mod medical_case;
pub mod patient;
pub mod traits;

pub use medical_case::MedicalCase;
pub use patient::Patient;
pub use traits::{same_identity, Entity, SortableField};
