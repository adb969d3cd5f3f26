use async_trait::async_trait;
use sqlx::PgPool;

use super::{advance_sequence, fetch_page, EntityStore, PatientStore};
use crate::error::{ApiError, Result};
use crate::models::Patient;
use crate::pagination::{Page, Pageable};

const PATIENT_COLUMNS: &str =
    "id, image, image_content_type, phone_number, idp_code, dob, location, created_date, dms_id";

const IDP_CODE_INDEX: &str = "ux_patient_idp_code";

/// A concurrent writer can claim an idpCode between the service's lookup and
/// this insert; the unique index is the final word.
fn unique_violation(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &err {
        if db.constraint() == Some(IDP_CODE_INDEX) {
            return ApiError::DuplicateValue("idpCode".to_string());
        }
    }
    ApiError::DatabaseError(err)
}

pub struct PatientRepository {
    pool: PgPool,
}

impl PatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, patient: Patient) -> Result<Patient> {
        let sql = format!(
            r#"
            INSERT INTO patient (
                image, image_content_type, phone_number, idp_code,
                dob, location, created_date, dms_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );

        let saved = sqlx::query_as::<_, Patient>(&sql)
            .bind(patient.image)
            .bind(patient.image_content_type)
            .bind(patient.phone_number)
            .bind(patient.idp_code)
            .bind(patient.dob)
            .bind(patient.location)
            .bind(patient.created_date)
            .bind(patient.dms_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unique_violation)?;

        tracing::info!(patient_id = ?saved.id, "Created patient");
        Ok(saved)
    }

    async fn upsert(&self, id: i64, patient: Patient) -> Result<Patient> {
        let sql = format!(
            r#"
            INSERT INTO patient (
                id, image, image_content_type, phone_number, idp_code,
                dob, location, created_date, dms_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                image = EXCLUDED.image,
                image_content_type = EXCLUDED.image_content_type,
                phone_number = EXCLUDED.phone_number,
                idp_code = EXCLUDED.idp_code,
                dob = EXCLUDED.dob,
                location = EXCLUDED.location,
                created_date = EXCLUDED.created_date,
                dms_id = EXCLUDED.dms_id
            RETURNING {}
            "#,
            PATIENT_COLUMNS
        );

        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .bind(patient.image)
            .bind(patient.image_content_type)
            .bind(patient.phone_number)
            .bind(patient.idp_code)
            .bind(patient.dob)
            .bind(patient.location)
            .bind(patient.created_date)
            .bind(patient.dms_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unique_violation)?;

        advance_sequence(&mut tx, "patient", id).await?;
        tx.commit().await?;

        tracing::info!(patient_id = id, "Saved patient");
        Ok(saved)
    }

    async fn exists(&self, table: &str, id: i64) -> Result<bool> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", table);
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn require_pair(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
        if !self.exists("patient", patient_id).await?
            || !self.exists("medical_case", medical_case_id).await?
        {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore<Patient> for PatientRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Patient>> {
        let sql = format!("SELECT {} FROM patient WHERE id = $1", PATIENT_COLUMNS);
        let patient = sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn save(&self, patient: Patient) -> Result<Patient> {
        match patient.id {
            Some(id) => self.upsert(id, patient).await,
            None => self.insert(patient).await,
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM patient WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            tracing::debug!(patient_id = id, "Delete of absent patient ignored");
        }
        Ok(())
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Patient>> {
        fetch_page(&self.pool, PATIENT_COLUMNS, pageable).await
    }
}

#[async_trait]
impl PatientStore for PatientRepository {
    async fn find_by_idp_code(&self, idp_code: &str) -> Result<Option<Patient>> {
        let sql = format!("SELECT {} FROM patient WHERE idp_code = $1", PATIENT_COLUMNS);
        let patient = sqlx::query_as::<_, Patient>(&sql)
            .bind(idp_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn add_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
        self.require_pair(patient_id, medical_case_id).await?;

        sqlx::query("UPDATE medical_case SET patient_id = $1 WHERE id = $2")
            .bind(patient_id)
            .bind(medical_case_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(patient_id, medical_case_id, "Attached medical case");
        Ok(())
    }

    async fn remove_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
        self.require_pair(patient_id, medical_case_id).await?;

        let updated =
            sqlx::query("UPDATE medical_case SET patient_id = NULL WHERE id = $1 AND patient_id = $2")
                .bind(medical_case_id)
                .bind(patient_id)
                .execute(&self.pool)
                .await?;

        if updated.rows_affected() > 0 {
            tracing::info!(patient_id, medical_case_id, "Detached medical case");
        }
        Ok(())
    }

    async fn medical_case_ids(&self, patient_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM medical_case WHERE patient_id = $1 ORDER BY id")
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
