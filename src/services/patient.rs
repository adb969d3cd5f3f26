use std::sync::Arc;
use uuid::Uuid;

use super::dto::PatientDto;
use crate::client::{SiteBodyCreate, SiteVisibility, SitesApiClient};
use crate::error::{ApiError, Result};
use crate::models::{MedicalCase, Patient};
use crate::pagination::{Page, Pageable};
use crate::repository::{EntityStore, PatientStore};
use crate::search::SearchIndex;

pub const ENTITY_NAME: &str = "patientServicePatient";

fn idp_code_in_use() -> ApiError {
    ApiError::bad_request_alert("idpCode is already in use", ENTITY_NAME, "idpcodeexists")
}

pub struct PatientService {
    store: Arc<dyn PatientStore>,
    index: Arc<dyn SearchIndex<Patient>>,
    medical_cases: Arc<dyn EntityStore<MedicalCase>>,
    medical_case_index: Arc<dyn SearchIndex<MedicalCase>>,
    sites: Option<Arc<SitesApiClient>>,
}

impl PatientService {
    pub fn new(
        store: Arc<dyn PatientStore>,
        index: Arc<dyn SearchIndex<Patient>>,
        medical_cases: Arc<dyn EntityStore<MedicalCase>>,
        medical_case_index: Arc<dyn SearchIndex<MedicalCase>>,
    ) -> Self {
        Self {
            store,
            index,
            medical_cases,
            medical_case_index,
            sites: None,
        }
    }

    /// New patients without a `dmsId` get a private site in the document system.
    pub fn with_site_provisioning(mut self, sites: Arc<SitesApiClient>) -> Self {
        self.sites = Some(sites);
        self
    }

    pub async fn save(&self, dto: PatientDto) -> Result<PatientDto> {
        tracing::debug!(id = ?dto.id, idp_code = ?dto.idp_code, "Request to save Patient");

        if let Some(idp_code) = dto.idp_code.as_deref() {
            if let Some(holder) = self.store.find_by_idp_code(idp_code).await? {
                if holder.id != dto.id {
                    return Err(idp_code_in_use());
                }
            }
        }

        let mut patient = Patient::from(dto);
        if patient.id.is_none() && patient.dms_id.is_none() {
            if let Some(sites) = &self.sites {
                patient.dms_id = Some(self.provision_site(sites, &patient).await?);
            }
        }

        let saved = match self.store.save(patient).await {
            Err(ApiError::DuplicateValue(field)) if field == "idpCode" => {
                return Err(idp_code_in_use())
            }
            other => other?,
        };
        self.index.index(&saved).await?;
        Ok(saved.into())
    }

    async fn provision_site(&self, sites: &SitesApiClient, patient: &Patient) -> Result<String> {
        let body = SiteBodyCreate {
            id: Some(format!("patient-{}", Uuid::new_v4().simple())),
            title: patient
                .idp_code
                .clone()
                .unwrap_or_else(|| "Patient".to_string()),
            description: None,
            visibility: SiteVisibility::Private,
        };

        let site = sites.create_site(&body).await?;
        tracing::info!(site_id = %site.id, client = sites.name(), "Provisioned patient site");
        Ok(site.id)
    }

    pub async fn find_all(&self, pageable: &Pageable) -> Result<Page<PatientDto>> {
        tracing::debug!("Request to get all Patients");
        Ok(self.store.find_all(pageable).await?.map(PatientDto::from))
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<PatientDto>> {
        tracing::debug!(id, "Request to get Patient");
        Ok(self.store.find_by_id(id).await?.map(PatientDto::from))
    }

    pub async fn find_by_idp_code(&self, idp_code: &str) -> Result<Option<PatientDto>> {
        tracing::debug!(idp_code, "Request to get Patient by idpCode");
        Ok(self
            .store
            .find_by_idp_code(idp_code)
            .await?
            .map(PatientDto::from))
    }

    /// Owned cases are detached by the store; their index entries are refreshed here.
    pub async fn delete(&self, id: i64) -> Result<()> {
        tracing::debug!(id, "Request to delete Patient");
        let owned = self.store.medical_case_ids(id).await?;

        self.store.delete_by_id(id).await?;
        self.index.remove(id).await?;

        for medical_case_id in owned {
            self.reindex_medical_case(medical_case_id).await?;
        }
        Ok(())
    }

    pub async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<PatientDto>> {
        tracing::debug!(query, "Request to search for a page of Patients");
        Ok(self.index.search(query, pageable).await?.map(PatientDto::from))
    }

    pub async fn add_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
        self.store
            .add_medical_case(patient_id, medical_case_id)
            .await?;
        self.reindex_medical_case(medical_case_id).await
    }

    pub async fn remove_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
        self.store
            .remove_medical_case(patient_id, medical_case_id)
            .await?;
        self.reindex_medical_case(medical_case_id).await
    }

    pub async fn medical_case_ids(&self, patient_id: i64) -> Result<Vec<i64>> {
        if self.store.find_by_id(patient_id).await?.is_none() {
            return Err(ApiError::NotFound);
        }
        self.store.medical_case_ids(patient_id).await
    }

    async fn reindex_medical_case(&self, medical_case_id: i64) -> Result<()> {
        if let Some(medical_case) = self.medical_cases.find_by_id(medical_case_id).await? {
            self.medical_case_index.index(&medical_case).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use crate::search::InMemoryIndex;

    struct Fixture {
        service: PatientService,
        store: Arc<InMemoryStore>,
        case_index: Arc<InMemoryIndex<MedicalCase>>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let case_index = Arc::new(InMemoryIndex::<MedicalCase>::new());
        let service = PatientService::new(
            store.clone(),
            Arc::new(InMemoryIndex::<Patient>::new()),
            store.clone(),
            case_index.clone(),
        );
        Fixture {
            service,
            store,
            case_index,
        }
    }

    fn dto(idp_code: &str) -> PatientDto {
        PatientDto {
            idp_code: Some(idp_code.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_idp_code_is_rejected() {
        let f = fixture();
        f.service.save(dto("idp-1")).await.unwrap();

        let err = f.service.save(dto("idp-1")).await.unwrap_err();
        match err {
            ApiError::BadRequestAlert { error_key, .. } => assert_eq!(error_key, "idpcodeexists"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Misses every idpCode lookup, as a concurrent writer would see it
    /// just before the other insert commits.
    struct StaleLookupStore(InMemoryStore);

    #[async_trait::async_trait]
    impl EntityStore<Patient> for StaleLookupStore {
        async fn find_by_id(&self, id: i64) -> Result<Option<Patient>> {
            EntityStore::<Patient>::find_by_id(&self.0, id).await
        }

        async fn save(&self, patient: Patient) -> Result<Patient> {
            EntityStore::<Patient>::save(&self.0, patient).await
        }

        async fn delete_by_id(&self, id: i64) -> Result<()> {
            EntityStore::<Patient>::delete_by_id(&self.0, id).await
        }

        async fn find_all(&self, pageable: &Pageable) -> Result<Page<Patient>> {
            EntityStore::<Patient>::find_all(&self.0, pageable).await
        }
    }

    #[async_trait::async_trait]
    impl PatientStore for StaleLookupStore {
        async fn find_by_idp_code(&self, _idp_code: &str) -> Result<Option<Patient>> {
            Ok(None)
        }

        async fn add_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
            self.0.add_medical_case(patient_id, medical_case_id).await
        }

        async fn remove_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
            self.0.remove_medical_case(patient_id, medical_case_id).await
        }

        async fn medical_case_ids(&self, patient_id: i64) -> Result<Vec<i64>> {
            self.0.medical_case_ids(patient_id).await
        }

        async fn ping(&self) -> Result<()> {
            self.0.ping().await
        }
    }

    #[tokio::test]
    async fn test_idp_code_claimed_after_lookup_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let service = PatientService::new(
            Arc::new(StaleLookupStore(InMemoryStore::new())),
            Arc::new(InMemoryIndex::<Patient>::new()),
            store.clone(),
            Arc::new(InMemoryIndex::<MedicalCase>::new()),
        );
        service.save(dto("idp-1")).await.unwrap();

        let err = service.save(dto("idp-1")).await.unwrap_err();
        match err {
            ApiError::BadRequestAlert { error_key, entity_name, .. } => {
                assert_eq!(error_key, "idpcodeexists");
                assert_eq!(entity_name, ENTITY_NAME);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resaving_own_idp_code_is_allowed() {
        let f = fixture();
        let mut saved = f.service.save(dto("idp-1")).await.unwrap();
        saved.location = Some("Ward A".to_string());

        let updated = f.service.save(saved).await.unwrap();
        assert_eq!(updated.location.as_deref(), Some("Ward A"));
    }

    #[tokio::test]
    async fn test_attach_reindexes_medical_case() {
        let f = fixture();
        let patient = f.service.save(dto("idp-1")).await.unwrap();
        let medical_case =
            EntityStore::<MedicalCase>::save(f.store.as_ref(), MedicalCase::default())
                .await
                .unwrap();
        let (patient_id, case_id) = (patient.id.unwrap(), medical_case.id.unwrap());

        f.service.add_medical_case(patient_id, case_id).await.unwrap();

        assert_eq!(f.service.medical_case_ids(patient_id).await.unwrap(), vec![case_id]);
        let hits = f
            .case_index
            .search(&patient_id.to_string(), &Pageable::default())
            .await
            .unwrap();
        assert_eq!(hits.content[0].patient_id, Some(patient_id));

        f.service.remove_medical_case(patient_id, case_id).await.unwrap();
        assert!(f.service.medical_case_ids(patient_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_case_ids_of_missing_patient_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.service.medical_case_ids(404).await,
            Err(ApiError::NotFound)
        ));
    }
}
