use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::geo::{AddressResolver, Coordinate, GeocodeError, ReferenceTable};
use crate::housing::domain::{
    Accommodation, AccommodationDraft, AccommodationId, DatePeriod, Member, MemberId, Rating,
    RatingDraft, RatingId, Reservation, ReservationDraft, ReservationId, ReservationStatus,
    ResolvedLocation,
};
use crate::housing::memory::InMemoryHousingStore;
use crate::housing::repository::{
    HousingRepository, NotificationError, NotificationPublisher, ReservationNotice,
};
use crate::housing::service::{AccommodationService, RatingService, ReservationService};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn main_campus() -> Coordinate {
    Coordinate::new(22.28405, 114.13784)
}

pub(super) fn resolved_location(coordinate: Coordinate) -> ResolvedLocation {
    ResolvedLocation {
        coordinate,
        campus_distances_km: ReferenceTable::campus_sites().distances_from(coordinate),
    }
}

/// Resolver double that always succeeds at one coordinate and counts lookups.
pub(super) struct FixedResolver {
    coordinate: Coordinate,
    calls: AtomicUsize,
}

impl FixedResolver {
    pub(super) fn at(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressResolver for FixedResolver {
    async fn resolve(&self, _address: &str) -> Result<Coordinate, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.coordinate)
    }
}

/// Resolver double that never finds a candidate.
pub(super) struct RefusingResolver;

#[async_trait]
impl AddressResolver for RefusingResolver {
    async fn resolve(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        Err(GeocodeError::NoMatch(address.to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<ReservationNotice>>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<ReservationNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for RecordingNotifier {
    fn publish(&self, notice: ReservationNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl NotificationPublisher for FailingNotifier {
    fn publish(&self, _notice: ReservationNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) fn store() -> Arc<InMemoryHousingStore> {
    Arc::new(InMemoryHousingStore::default())
}

// Seeded records use a high id range so they never collide with service-issued ids.

pub(super) fn seeded_accommodation(store: &InMemoryHousingStore, id: u64) -> Accommodation {
    let record = Accommodation {
        id: AccommodationId(id),
        address: "12 University Drive".to_string(),
        building_name: "Harmony Court".to_string(),
        floor_number: 3,
        flat_number: "B".to_string(),
        room_number: Some(2),
        availability_start: date(2024, 1, 1),
        availability_end: date(2025, 12, 31),
        monthly_rent: 8800,
        capacity: 2,
        managed_by: "CEDARS".to_string(),
        active: true,
        location: resolved_location(main_campus()),
    };
    store
        .insert_accommodation(record)
        .expect("accommodation inserts")
}

pub(super) fn seeded_accommodation_at(
    store: &InMemoryHousingStore,
    id: u64,
    coordinate: Coordinate,
) -> Accommodation {
    let record = Accommodation {
        id: AccommodationId(id),
        address: format!("{id} University Drive"),
        building_name: "Harmony Court".to_string(),
        floor_number: 3,
        flat_number: "B".to_string(),
        room_number: None,
        availability_start: date(2024, 1, 1),
        availability_end: date(2025, 12, 31),
        monthly_rent: 8800,
        capacity: 2,
        managed_by: "CEDARS".to_string(),
        active: true,
        location: resolved_location(coordinate),
    };
    store
        .insert_accommodation(record)
        .expect("accommodation inserts")
}

pub(super) fn seeded_member(store: &InMemoryHousingStore, id: u64) -> Member {
    let record = Member {
        id: MemberId(id),
        name: "Mei Ling".to_string(),
        contact: format!("+852-9000-{id}"),
        institute: "HKU".to_string(),
        email: format!("member{id}@connect.hku.hk"),
        active: true,
    };
    store.insert_member(record).expect("member inserts")
}

pub(super) fn seeded_reservation(
    store: &InMemoryHousingStore,
    id: u64,
    accommodation: AccommodationId,
    member: MemberId,
    start: NaiveDate,
    end: NaiveDate,
    active: bool,
) -> Reservation {
    let record = Reservation {
        id: ReservationId(id),
        accommodation,
        member,
        period: DatePeriod::new(start, end),
        status: ReservationStatus::NotSigned,
        active,
    };
    store.insert_reservation(record).expect("reservation inserts")
}

pub(super) fn seeded_rating(
    store: &InMemoryHousingStore,
    id: u64,
    accommodation: AccommodationId,
    member: MemberId,
    value: u8,
) -> Rating {
    let record = Rating {
        id: RatingId(id),
        accommodation,
        member,
        rating: value,
        comment: None,
        active: true,
    };
    store.insert_rating(record).expect("rating inserts")
}

pub(super) fn accommodation_draft() -> AccommodationDraft {
    AccommodationDraft {
        address: "12 University Drive".to_string(),
        building_name: "Harmony Court".to_string(),
        floor_number: 3,
        flat_number: "B".to_string(),
        room_number: Some(2),
        availability_start: date(2024, 1, 1),
        availability_end: date(2025, 12, 31),
        monthly_rent: 8800,
        capacity: 2,
        managed_by: "CEDARS".to_string(),
        active: true,
    }
}

pub(super) fn reservation_draft(
    accommodation: AccommodationId,
    member: MemberId,
    start: NaiveDate,
    end: NaiveDate,
) -> ReservationDraft {
    ReservationDraft {
        accommodation,
        member,
        start_date: start,
        end_date: end,
        status: ReservationStatus::NotSigned,
        active: true,
    }
}

pub(super) fn rating_draft(accommodation: AccommodationId, member: MemberId, value: u8) -> RatingDraft {
    RatingDraft {
        accommodation,
        member,
        rating: value,
        comment: Some("Quiet and close to campus".to_string()),
        active: true,
    }
}

pub(super) fn accommodation_service(
    store: Arc<InMemoryHousingStore>,
    resolver: Arc<FixedResolver>,
) -> AccommodationService<InMemoryHousingStore, FixedResolver> {
    AccommodationService::new(store, resolver, ReferenceTable::campus_sites())
}

pub(super) fn reservation_service(
    store: Arc<InMemoryHousingStore>,
) -> (
    ReservationService<InMemoryHousingStore, RecordingNotifier>,
    Arc<RecordingNotifier>,
) {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = ReservationService::new(store, notifier.clone());
    (service, notifier)
}

pub(super) fn rating_service(store: Arc<InMemoryHousingStore>) -> RatingService<InMemoryHousingStore> {
    RatingService::new(store)
}
