//! Rating workflow through the public facade and router: stay-gated eligibility,
//! pair uniqueness, and value ranking.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use unihaven::geo::{Coordinate, ReferenceTable};
    use unihaven::housing::{
        Accommodation, AccommodationId, DatePeriod, HousingRepository, InMemoryHousingStore,
        Member, MemberId, RatingService, Reservation, ReservationId, ReservationStatus,
        ResolvedLocation,
    };

    pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub(crate) struct Fixture {
        pub(crate) store: Arc<InMemoryHousingStore>,
        pub(crate) accommodation: AccommodationId,
        pub(crate) members: Vec<MemberId>,
    }

    /// Store seeded with one accommodation, the given members, and one completed
    /// (year 2020) stay per member so rating inserts are eligible.
    pub(crate) fn fixture(accommodation_id: u64, member_ids: &[u64]) -> Fixture {
        let store = Arc::new(InMemoryHousingStore::default());
        let coordinate = Coordinate::new(22.28405, 114.13784);
        store
            .insert_accommodation(Accommodation {
                id: AccommodationId(accommodation_id),
                address: "12 University Drive".to_string(),
                building_name: "Harmony Court".to_string(),
                floor_number: 3,
                flat_number: "B".to_string(),
                room_number: Some(2),
                availability_start: date(2020, 1, 1),
                availability_end: date(2025, 12, 31),
                monthly_rent: 8800,
                capacity: 2,
                managed_by: "CEDARS".to_string(),
                active: true,
                location: ResolvedLocation {
                    coordinate,
                    campus_distances_km: ReferenceTable::campus_sites()
                        .distances_from(coordinate),
                },
            })
            .expect("accommodation inserts");

        let mut members = Vec::new();
        for (offset, &id) in member_ids.iter().enumerate() {
            store
                .insert_member(Member {
                    id: MemberId(id),
                    name: "Mei Ling".to_string(),
                    contact: format!("+852-9000-{id}"),
                    institute: "HKU".to_string(),
                    email: format!("member{id}@connect.hku.hk"),
                    active: true,
                })
                .expect("member inserts");
            store
                .insert_reservation(Reservation {
                    id: ReservationId(id),
                    accommodation: AccommodationId(accommodation_id),
                    member: MemberId(id),
                    period: DatePeriod::new(
                        date(2020, 1 + offset as u32, 1),
                        date(2020, 1 + offset as u32, 20),
                    ),
                    status: ReservationStatus::Signed,
                    active: true,
                })
                .expect("reservation inserts");
            members.push(MemberId(id));
        }

        Fixture {
            store,
            accommodation: AccommodationId(accommodation_id),
            members,
        }
    }

    pub(crate) fn service(store: Arc<InMemoryHousingStore>) -> RatingService<InMemoryHousingStore> {
        RatingService::new(store)
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use common::*;
use unihaven::housing::{rating_router, RatingDraft, RatingServiceError, RatingViolation};

fn draft(
    accommodation: unihaven::housing::AccommodationId,
    member: unihaven::housing::MemberId,
    value: u8,
) -> RatingDraft {
    RatingDraft {
        accommodation,
        member,
        rating: value,
        comment: None,
        active: true,
    }
}

#[test]
fn rating_requires_a_stay_that_ended_before_today() {
    let fixture = fixture(201, &[2011]);
    let service = service(fixture.store.clone());

    // Evaluated as of a date inside the stay: not yet eligible.
    match service.create(
        draft(fixture.accommodation, fixture.members[0], 4),
        date(2020, 2, 1),
    ) {
        Err(RatingServiceError::Violation(RatingViolation::NoCompletedStay)) => {}
        other => panic!("expected no completed stay, got {other:?}"),
    }

    // Evaluated after the stay ended: accepted.
    service
        .create(
            draft(fixture.accommodation, fixture.members[0], 4),
            date(2020, 6, 1),
        )
        .expect("eligible rating accepted");
}

#[test]
fn out_of_range_values_are_rejected_before_any_lookup() {
    let fixture = fixture(202, &[2021]);
    let service = service(fixture.store.clone());

    match service.create(
        draft(fixture.accommodation, fixture.members[0], 6),
        date(2020, 6, 1),
    ) {
        Err(RatingServiceError::Violation(RatingViolation::InvalidRatingValue { value: 6 })) => {}
        other => panic!("expected invalid value, got {other:?}"),
    }
}

#[tokio::test]
async fn router_rejects_duplicate_pairs_and_ranks_by_value() {
    let fixture = fixture(203, &[2031, 2032, 2033]);
    let service = service(fixture.store.clone());
    let router = rating_router(Arc::new(service));

    // Stays ended in 2020, so inserts evaluated against the real clock are eligible.
    for (member, value) in fixture.members.iter().zip([5u8, 3, 5]) {
        let payload = serde_json::to_string(&draft(fixture.accommodation, *member, value))
            .expect("draft serializes");
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/ratings")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let payload = serde_json::to_string(&draft(fixture.accommodation, fixture.members[0], 2))
        .expect("draft serializes");
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/ratings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/ratings/ranked")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 65536)
        .await
        .expect("read body");
    let listed: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    let values: Vec<u64> = listed
        .as_array()
        .expect("array")
        .iter()
        .map(|record| record["rating"].as_u64().expect("numeric rating"))
        .collect();
    assert_eq!(values, vec![5, 5, 3], "highest first by default");

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/ratings/ranked?reverse=true")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    let body = axum::body::to_bytes(response.into_body(), 65536)
        .await
        .expect("read body");
    let listed: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    let values: Vec<u64> = listed
        .as_array()
        .expect("array")
        .iter()
        .map(|record| record["rating"].as_u64().expect("numeric rating"))
        .collect();
    assert_eq!(values, vec![3, 5, 5], "reverse flips the value order");
}
