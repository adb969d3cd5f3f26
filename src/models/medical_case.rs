use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::traits::{Entity, SortableField};

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MedicalCase {
    pub id: Option<i64>,
    pub dms_id: Option<String>,
    pub location: Option<String>,
    pub created_date: Option<NaiveDate>,
    /// Owning patient, `None` once detached.
    pub patient_id: Option<i64>,
}

impl Entity for MedicalCase {
    const ENTITY_NAME: &'static str = "MedicalCase";
    const TABLE_NAME: &'static str = "medical_case";
    const INDEX_NAME: &'static str = "medicalcase";
    const SORTABLE: &'static [SortableField] = &[
        SortableField::plain("id", "id"),
        SortableField::text("dmsId", "dms_id"),
        SortableField::text("location", "location"),
        SortableField::plain("createdDate", "created_date"),
        SortableField::plain("patientId", "patient_id"),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
