pub mod medical_case;
pub mod memory;
pub mod patient;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::error::Result;
use crate::models::{Entity, Patient};
use crate::pagination::{Page, Pageable};

pub use medical_case::MedicalCaseRepository;
pub use memory::InMemoryStore;
pub use patient::PatientRepository;

/// Record store over one entity type keyed by a store-assigned id.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<E>>;

    /// Assigns an id when absent, otherwise overwrites the record at that id.
    async fn save(&self, entity: E) -> Result<E>;

    /// Deleting an absent id is a no-op.
    async fn delete_by_id(&self, id: i64) -> Result<()>;

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<E>>;
}

#[async_trait]
pub trait PatientStore: EntityStore<Patient> {
    async fn find_by_idp_code(&self, idp_code: &str) -> Result<Option<Patient>>;

    /// Point the medical case's back-reference at the patient.
    async fn add_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()>;

    /// Clear the back-reference if the case currently belongs to the patient.
    async fn remove_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()>;

    async fn medical_case_ids(&self, patient_id: i64) -> Result<Vec<i64>>;

    async fn ping(&self) -> Result<()>;
}

/// Paged `SELECT` with a whitelisted `ORDER BY`.
pub(crate) async fn fetch_page<E>(pool: &PgPool, columns: &str, pageable: &Pageable) -> Result<Page<E>>
where
    E: Entity + for<'r> FromRow<'r, PgRow> + Unpin,
{
    let order_by = pageable
        .resolve_sort::<E>()?
        .iter()
        .map(|(field, direction)| format!("{} {}", field.column, direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT {} FROM {} ORDER BY {} LIMIT $1 OFFSET $2",
        columns,
        E::TABLE_NAME,
        order_by
    );

    let content = sqlx::query_as::<_, E>(&sql)
        .bind(pageable.size as i64)
        .bind(pageable.offset() as i64)
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", E::TABLE_NAME))
        .fetch_one(pool)
        .await?;

    Ok(Page::new(content, pageable, total.max(0) as u64))
}

/// Keep the id sequence ahead of an explicitly written id. A fresh sequence
/// (`is_called` still false) would hand out `last_value` itself next, so it
/// is advanced even when `last_value` already equals the written id.
pub(crate) async fn advance_sequence(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    id: i64,
) -> Result<()> {
    let sequence = format!("{}_id_seq", table);
    let sql = format!(
        "SELECT setval('{0}', GREATEST($1, last_value), true) FROM {0} \
         WHERE last_value < $1 OR NOT is_called",
        sequence
    );
    sqlx::query(&sql).bind(id).fetch_optional(&mut **tx).await?;
    Ok(())
}
