use async_trait::async_trait;
use sqlx::PgPool;

use super::{advance_sequence, fetch_page, EntityStore};
use crate::error::Result;
use crate::models::MedicalCase;
use crate::pagination::{Page, Pageable};

const MEDICAL_CASE_COLUMNS: &str = "id, dms_id, location, created_date, patient_id";

pub struct MedicalCaseRepository {
    pool: PgPool,
}

impl MedicalCaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<MedicalCase> for MedicalCaseRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<MedicalCase>> {
        let sql = format!(
            "SELECT {} FROM medical_case WHERE id = $1",
            MEDICAL_CASE_COLUMNS
        );
        let medical_case = sqlx::query_as::<_, MedicalCase>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(medical_case)
    }

    async fn save(&self, medical_case: MedicalCase) -> Result<MedicalCase> {
        let Some(id) = medical_case.id else {
            let sql = format!(
                r#"
                INSERT INTO medical_case (dms_id, location, created_date, patient_id)
                VALUES ($1, $2, $3, $4)
                RETURNING {}
                "#,
                MEDICAL_CASE_COLUMNS
            );
            let saved = sqlx::query_as::<_, MedicalCase>(&sql)
                .bind(medical_case.dms_id)
                .bind(medical_case.location)
                .bind(medical_case.created_date)
                .bind(medical_case.patient_id)
                .fetch_one(&self.pool)
                .await?;

            tracing::info!(medical_case_id = ?saved.id, "Created medical case");
            return Ok(saved);
        };

        let sql = format!(
            r#"
            INSERT INTO medical_case (id, dms_id, location, created_date, patient_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                dms_id = EXCLUDED.dms_id,
                location = EXCLUDED.location,
                created_date = EXCLUDED.created_date,
                patient_id = EXCLUDED.patient_id
            RETURNING {}
            "#,
            MEDICAL_CASE_COLUMNS
        );

        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, MedicalCase>(&sql)
            .bind(id)
            .bind(medical_case.dms_id)
            .bind(medical_case.location)
            .bind(medical_case.created_date)
            .bind(medical_case.patient_id)
            .fetch_one(&mut *tx)
            .await?;

        advance_sequence(&mut tx, "medical_case", id).await?;
        tx.commit().await?;

        tracing::info!(medical_case_id = id, "Saved medical case");
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM medical_case WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<MedicalCase>> {
        fetch_page(&self.pool, MEDICAL_CASE_COLUMNS, pageable).await
    }
}
