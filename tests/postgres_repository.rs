//! Run with a reachable database: `DATABASE_URL=... cargo test -- --ignored`

mod common;

use chrono::NaiveDate;

use patient_service::error::ApiError;
use patient_service::models::{MedicalCase, Patient};
use patient_service::pagination::{Pageable, SortDirection};
use patient_service::repository::{EntityStore, MedicalCaseRepository, PatientRepository, PatientStore};

fn patient(idp_code: &str) -> Patient {
    Patient {
        idp_code: Some(idp_code.to_string()),
        dob: NaiveDate::from_ymd_opt(1990, 1, 1),
        location: Some("Ward A".to_string()),
        image: Some(vec![0x89, 0x50, 0x4e, 0x47]),
        image_content_type: Some("image/png".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_patient_crud() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let repo = PatientRepository::new(pool.clone());

    let created = repo.save(patient("idp-1")).await.expect("Failed to create patient");
    let id = created.id.expect("id assigned");

    let read = repo.find_by_id(id).await.unwrap().expect("patient exists");
    assert_eq!(read.idp_code.as_deref(), Some("idp-1"));
    assert_eq!(read.image, Some(vec![0x89, 0x50, 0x4e, 0x47]));

    let mut changed = read.clone();
    changed.location = Some("Ward B".to_string());
    let updated = repo.save(changed).await.unwrap();
    assert_eq!(updated.id, Some(id));
    assert_eq!(updated.location.as_deref(), Some("Ward B"));

    let by_code = repo.find_by_idp_code("idp-1").await.unwrap();
    assert_eq!(by_code.and_then(|p| p.id), Some(id));

    repo.delete_by_id(id).await.unwrap();
    assert!(repo.find_by_id(id).await.unwrap().is_none());
    // Deleting again is a no-op
    repo.delete_by_id(id).await.unwrap();

    common::cleanup_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn test_save_with_explicit_id_advances_sequence() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let repo = MedicalCaseRepository::new(pool.clone());

    let explicit = repo
        .save(MedicalCase {
            id: Some(100),
            dms_id: Some("X1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(explicit.id, Some(100));

    let next = repo.save(MedicalCase::default()).await.unwrap();
    assert!(next.id.unwrap() > 100);

    common::cleanup_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn test_explicit_first_id_on_fresh_sequence() {
    let pool = common::setup_test_db().await;
    // RESTART IDENTITY leaves the sequence at last_value 1, not yet called
    common::cleanup_test_db(&pool).await;
    let repo = MedicalCaseRepository::new(pool.clone());

    let explicit = repo
        .save(MedicalCase {
            id: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(explicit.id, Some(1));

    let next = repo
        .save(MedicalCase::default())
        .await
        .expect("generated id must not collide with the explicit one");
    assert!(next.id.unwrap() > 1);

    common::cleanup_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn test_duplicate_idp_code_hits_unique_index() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let repo = PatientRepository::new(pool.clone());

    repo.save(patient("idp-dup")).await.unwrap();

    let duplicate = repo.save(patient("idp-dup")).await;
    assert!(matches!(duplicate, Err(ApiError::DuplicateValue(ref field)) if field == "idpCode"));

    let mut explicit = patient("idp-dup");
    explicit.id = Some(500);
    assert!(matches!(repo.save(explicit).await, Err(ApiError::DuplicateValue(_))));

    common::cleanup_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn test_paging_and_sorting() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let repo = MedicalCaseRepository::new(pool.clone());

    for location in ["Bravo", "Alpha", "Charlie"] {
        repo.save(MedicalCase {
            location: Some(location.to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    let page = repo
        .find_all(&Pageable::of(0, 2).with_sort("location", SortDirection::Descending))
        .await
        .unwrap();
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.content[0].location.as_deref(), Some("Charlie"));

    let unknown = repo
        .find_all(&Pageable::default().with_sort("shoeSize", SortDirection::Ascending))
        .await;
    assert!(unknown.is_err());

    common::cleanup_test_db(&pool).await;
}

#[tokio::test]
#[ignore]
async fn test_medical_case_relation() {
    let pool = common::setup_test_db().await;
    common::cleanup_test_db(&pool).await;
    let patients = PatientRepository::new(pool.clone());
    let cases = MedicalCaseRepository::new(pool.clone());

    let patient_id = patients.save(patient("idp-2")).await.unwrap().id.unwrap();
    let case_id = cases.save(MedicalCase::default()).await.unwrap().id.unwrap();

    patients.add_medical_case(patient_id, case_id).await.unwrap();
    assert_eq!(patients.medical_case_ids(patient_id).await.unwrap(), vec![case_id]);

    patients.remove_medical_case(patient_id, case_id).await.unwrap();
    assert!(patients.medical_case_ids(patient_id).await.unwrap().is_empty());

    patients.add_medical_case(patient_id, case_id).await.unwrap();
    patients.delete_by_id(patient_id).await.unwrap();
    let detached = cases.find_by_id(case_id).await.unwrap().unwrap();
    assert_eq!(detached.patient_id, None);

    assert!(patients.add_medical_case(9999, case_id).await.is_err());
    patients.ping().await.unwrap();

    common::cleanup_test_db(&pool).await;
}
