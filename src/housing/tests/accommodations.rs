use std::sync::Arc;

use super::common::*;
use crate::geo::Coordinate;
use crate::geo::ReferenceTable;
use crate::housing::repository::HousingRepository;
use crate::housing::service::{AccommodationService, AccommodationServiceError};

#[tokio::test]
async fn create_persists_coordinate_and_all_campus_distances() {
    let store = store();
    let resolver = Arc::new(FixedResolver::at(main_campus()));
    let service = accommodation_service(store.clone(), resolver);

    let record = service
        .create(accommodation_draft())
        .await
        .expect("create accepted");

    assert_eq!(record.location.coordinate, main_campus());
    assert_eq!(
        record.location.campus_distances_km.len(),
        ReferenceTable::campus_sites().len()
    );
    assert_eq!(record.location.campus_distances_km["Main Campus"], 0.0);

    let stored = store
        .fetch_accommodation(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, record);
}

#[tokio::test]
async fn geocode_failure_persists_nothing() {
    let store = store();
    let service = AccommodationService::new(
        store.clone(),
        Arc::new(RefusingResolver),
        ReferenceTable::campus_sites(),
    );

    match service.create(accommodation_draft()).await {
        Err(AccommodationServiceError::Geocode(_)) => {}
        other => panic!("expected geocode failure, got {other:?}"),
    }

    let listed = store.list_accommodations().expect("list succeeds");
    assert!(listed.is_empty(), "failed save must not persist");
}

#[tokio::test]
async fn every_update_re_resolves_and_recomputes_distances() {
    let store = store();
    let resolver = Arc::new(FixedResolver::at(main_campus()));
    let service = accommodation_service(store.clone(), resolver.clone());

    let record = service
        .create(accommodation_draft())
        .await
        .expect("create accepted");
    assert_eq!(resolver.call_count(), 1);

    // Updating an unrelated field still re-resolves the address.
    let mut draft = accommodation_draft();
    draft.monthly_rent = 9200;
    let updated = service
        .update(&record.id, draft)
        .await
        .expect("update accepted");
    assert_eq!(resolver.call_count(), 2);
    assert_eq!(updated.monthly_rent, 9200);
    assert_eq!(updated.location, record.location);
}

#[tokio::test]
async fn failed_update_leaves_the_stored_record_untouched() {
    let store = store();
    let resolver = Arc::new(FixedResolver::at(main_campus()));
    let service = accommodation_service(store.clone(), resolver);

    let record = service
        .create(accommodation_draft())
        .await
        .expect("create accepted");

    let failing = AccommodationService::new(
        store.clone(),
        Arc::new(RefusingResolver),
        ReferenceTable::campus_sites(),
    );
    let mut draft = accommodation_draft();
    draft.monthly_rent = 9999;
    assert!(matches!(
        failing.update(&record.id, draft).await,
        Err(AccommodationServiceError::Geocode(_))
    ));

    let stored = store
        .fetch_accommodation(&record.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored, record, "failed update must not partially apply");
}

#[tokio::test]
async fn distances_move_with_the_resolved_coordinate() {
    let store = store();
    let resolver = Arc::new(FixedResolver::at(Coordinate::new(22.42, 114.21)));
    let service = accommodation_service(store, resolver);

    let record = service
        .create(accommodation_draft())
        .await
        .expect("create accepted");

    let main = record.location.campus_distances_km["Main Campus"];
    let kadoorie = record.location.campus_distances_km["Kadoorie Centre"];
    assert!(main > kadoorie, "a New Territories address sits closer to Kadoorie");
}
