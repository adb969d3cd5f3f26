use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::traits::{Entity, SortableField};

/// A patient. Owned medical cases point back through `MedicalCase::patient_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Option<i64>,
    #[serde(default, with = "super::binary")]
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub phone_number: Option<i64>,
    pub idp_code: Option<String>,
    pub dob: Option<NaiveDate>,
    pub location: Option<String>,
    pub created_date: Option<NaiveDate>,
    pub dms_id: Option<String>,
}

impl Entity for Patient {
    const ENTITY_NAME: &'static str = "Patient";
    const TABLE_NAME: &'static str = "patient";
    const INDEX_NAME: &'static str = "patient";
    const SORTABLE: &'static [SortableField] = &[
        SortableField::plain("id", "id"),
        SortableField::text("imageContentType", "image_content_type"),
        SortableField::plain("phoneNumber", "phone_number"),
        SortableField::text("idpCode", "idp_code"),
        SortableField::plain("dob", "dob"),
        SortableField::text("location", "location"),
        SortableField::plain("createdDate", "created_date"),
        SortableField::text("dmsId", "dms_id"),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
