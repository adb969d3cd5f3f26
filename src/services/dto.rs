//! API-boundary shapes and their mapping to persisted entities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{MedicalCase, Patient};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalCaseDto {
    pub id: Option<i64>,
    pub dms_id: Option<String>,
    pub location: Option<String>,
    pub created_date: Option<NaiveDate>,
    pub patient_id: Option<i64>,
}

impl From<MedicalCase> for MedicalCaseDto {
    fn from(entity: MedicalCase) -> Self {
        Self {
            id: entity.id,
            dms_id: entity.dms_id,
            location: entity.location,
            created_date: entity.created_date,
            patient_id: entity.patient_id,
        }
    }
}

impl From<MedicalCaseDto> for MedicalCase {
    fn from(dto: MedicalCaseDto) -> Self {
        Self {
            id: dto.id,
            dms_id: dto.dms_id,
            location: dto.location,
            created_date: dto.created_date,
            patient_id: dto.patient_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDto {
    pub id: Option<i64>,
    #[serde(default, with = "crate::models::binary")]
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub phone_number: Option<i64>,
    pub idp_code: Option<String>,
    pub dob: Option<NaiveDate>,
    pub location: Option<String>,
    pub created_date: Option<NaiveDate>,
    pub dms_id: Option<String>,
}

impl From<Patient> for PatientDto {
    fn from(entity: Patient) -> Self {
        Self {
            id: entity.id,
            image: entity.image,
            image_content_type: entity.image_content_type,
            phone_number: entity.phone_number,
            idp_code: entity.idp_code,
            dob: entity.dob,
            location: entity.location,
            created_date: entity.created_date,
            dms_id: entity.dms_id,
        }
    }
}

impl From<PatientDto> for Patient {
    fn from(dto: PatientDto) -> Self {
        Self {
            id: dto.id,
            image: dto.image,
            image_content_type: dto.image_content_type,
            phone_number: dto.phone_number,
            idp_code: dto.idp_code,
            dob: dto.dob,
            location: dto.location,
            created_date: dto.created_date,
            dms_id: dto.dms_id,
        }
    }
}
