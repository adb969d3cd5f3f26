use std::sync::Arc;

use super::dto::MedicalCaseDto;
use crate::error::Result;
use crate::models::MedicalCase;
use crate::pagination::{Page, Pageable};
use crate::repository::EntityStore;
use crate::search::SearchIndex;

/// Name used in alert headers and error payloads.
pub const ENTITY_NAME: &str = "patientServiceMedicalCase";

pub struct MedicalCaseService {
    store: Arc<dyn EntityStore<MedicalCase>>,
    index: Arc<dyn SearchIndex<MedicalCase>>,
}

impl MedicalCaseService {
    pub fn new(
        store: Arc<dyn EntityStore<MedicalCase>>,
        index: Arc<dyn SearchIndex<MedicalCase>>,
    ) -> Self {
        Self { store, index }
    }

    /// Persist then (re)index.
    pub async fn save(&self, dto: MedicalCaseDto) -> Result<MedicalCaseDto> {
        tracing::debug!(?dto, "Request to save MedicalCase");
        let saved = self.store.save(MedicalCase::from(dto)).await?;
        self.index.index(&saved).await?;
        Ok(saved.into())
    }

    pub async fn find_all(&self, pageable: &Pageable) -> Result<Page<MedicalCaseDto>> {
        tracing::debug!("Request to get all MedicalCases");
        Ok(self.store.find_all(pageable).await?.map(MedicalCaseDto::from))
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<MedicalCaseDto>> {
        tracing::debug!(id, "Request to get MedicalCase");
        Ok(self.store.find_by_id(id).await?.map(MedicalCaseDto::from))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        tracing::debug!(id, "Request to delete MedicalCase");
        self.store.delete_by_id(id).await?;
        self.index.remove(id).await
    }

    pub async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<MedicalCaseDto>> {
        tracing::debug!(query, "Request to search for a page of MedicalCases");
        Ok(self
            .index
            .search(query, pageable)
            .await?
            .map(MedicalCaseDto::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use crate::search::InMemoryIndex;

    fn service() -> (MedicalCaseService, Arc<InMemoryIndex<MedicalCase>>) {
        let index = Arc::new(InMemoryIndex::new());
        let service = MedicalCaseService::new(Arc::new(InMemoryStore::new()), index.clone());
        (service, index)
    }

    #[tokio::test]
    async fn test_save_indexes_and_delete_unindexes() {
        let (service, index) = service();

        let saved = service
            .save(MedicalCaseDto {
                dms_id: Some("X1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(index.len(), 1);

        service.delete(saved.id.unwrap()).await.unwrap();
        assert!(index.is_empty());
        assert!(service.find_one(saved.id.unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_reindexes_new_values() {
        let (service, _) = service();

        let mut saved = service
            .save(MedicalCaseDto {
                location: Some("North Wing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        saved.location = Some("South Wing".to_string());
        service.save(saved).await.unwrap();

        let hits = service.search("north", &Pageable::default()).await.unwrap();
        assert_eq!(hits.total_elements, 0);
        let hits = service.search("south", &Pageable::default()).await.unwrap();
        assert_eq!(hits.total_elements, 1);
    }
}
