//! In-process record store for tests and database-less local runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::{EntityStore, PatientStore};
use crate::error::{ApiError, Result};
use crate::models::{Entity, MedicalCase, Patient};
use crate::pagination::{page_in_memory, Page, Pageable};

#[derive(Debug)]
struct Table<E> {
    rows: BTreeMap<i64, E>,
    next_id: i64,
}

impl<E: Entity> Table<E> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn save(&mut self, mut entity: E) -> Result<E> {
        let id = match entity.id() {
            Some(id) => id,
            None => self.next_id,
        };
        let following = id
            .checked_add(1)
            .ok_or_else(|| ApiError::InvalidRequest(format!("Id {} is out of range", id)))?;
        self.next_id = self.next_id.max(following);
        entity.set_id(id);
        self.rows.insert(id, entity.clone());
        Ok(entity)
    }
}

#[derive(Debug)]
struct Tables {
    patients: Table<Patient>,
    medical_cases: Table<MedicalCase>,
}

/// Both tables sit behind one lock so relation updates are atomic.
#[derive(Debug)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                patients: Table::new(),
                medical_cases: Table::new(),
            }),
        }
    }
}

#[async_trait]
impl EntityStore<Patient> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Patient>> {
        Ok(self.tables.lock().patients.rows.get(&id).cloned())
    }

    async fn save(&self, patient: Patient) -> Result<Patient> {
        let mut tables = self.tables.lock();
        if let Some(idp_code) = patient.idp_code.as_deref() {
            let taken = tables
                .patients
                .rows
                .values()
                .any(|other| other.idp_code.as_deref() == Some(idp_code) && other.id != patient.id);
            if taken {
                return Err(ApiError::DuplicateValue("idpCode".to_string()));
            }
        }
        tables.patients.save(patient)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.lock();
        if tables.patients.rows.remove(&id).is_some() {
            for medical_case in tables.medical_cases.rows.values_mut() {
                if medical_case.patient_id == Some(id) {
                    medical_case.patient_id = None;
                }
            }
        }
        Ok(())
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<Patient>> {
        let rows: Vec<Patient> = self.tables.lock().patients.rows.values().cloned().collect();
        page_in_memory(rows, pageable)
    }
}

#[async_trait]
impl EntityStore<MedicalCase> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<MedicalCase>> {
        Ok(self.tables.lock().medical_cases.rows.get(&id).cloned())
    }

    async fn save(&self, medical_case: MedicalCase) -> Result<MedicalCase> {
        self.tables.lock().medical_cases.save(medical_case)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.tables.lock().medical_cases.rows.remove(&id);
        Ok(())
    }

    async fn find_all(&self, pageable: &Pageable) -> Result<Page<MedicalCase>> {
        let rows: Vec<MedicalCase> = self
            .tables
            .lock()
            .medical_cases
            .rows
            .values()
            .cloned()
            .collect();
        page_in_memory(rows, pageable)
    }
}

#[async_trait]
impl PatientStore for InMemoryStore {
    async fn find_by_idp_code(&self, idp_code: &str) -> Result<Option<Patient>> {
        Ok(self
            .tables
            .lock()
            .patients
            .rows
            .values()
            .find(|p| p.idp_code.as_deref() == Some(idp_code))
            .cloned())
    }

    async fn add_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
        let mut tables = self.tables.lock();
        if !tables.patients.rows.contains_key(&patient_id) {
            return Err(ApiError::NotFound);
        }
        let medical_case = tables
            .medical_cases
            .rows
            .get_mut(&medical_case_id)
            .ok_or(ApiError::NotFound)?;
        medical_case.patient_id = Some(patient_id);
        Ok(())
    }

    async fn remove_medical_case(&self, patient_id: i64, medical_case_id: i64) -> Result<()> {
        let mut tables = self.tables.lock();
        if !tables.patients.rows.contains_key(&patient_id) {
            return Err(ApiError::NotFound);
        }
        let medical_case = tables
            .medical_cases
            .rows
            .get_mut(&medical_case_id)
            .ok_or(ApiError::NotFound)?;
        if medical_case.patient_id == Some(patient_id) {
            medical_case.patient_id = None;
        }
        Ok(())
    }

    async fn medical_case_ids(&self, patient_id: i64) -> Result<Vec<i64>> {
        Ok(self
            .tables
            .lock()
            .medical_cases
            .rows
            .values()
            .filter(|c| c.patient_id == Some(patient_id))
            .filter_map(|c| c.id)
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
