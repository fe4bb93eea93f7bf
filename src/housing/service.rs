//! Services composing the resolver, distance table, repository, validators, and the
//! notification boundary.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::warn;

use super::domain::{
    Accommodation, AccommodationDraft, AccommodationId, DatePeriod, Member, MemberDraft, MemberId,
    Rating, RatingChange, RatingDraft, RatingId, Reservation, ReservationChange, ReservationDraft,
    ReservationId, ReservationStatus, ResolvedLocation,
};
use super::eligibility::{self, RatingViolation};
use super::repository::{
    HousingRepository, NotificationPublisher, RepositoryError, ReservationNotice,
};
use super::validate::{active_flag_changed, validate_reservation, ReservationViolation};
use crate::geo::{AddressResolver, GeocodeError, ReferenceTable};

static ACCOMMODATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static MEMBER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RESERVATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RATING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_accommodation_id() -> AccommodationId {
    AccommodationId(ACCOMMODATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_member_id() -> MemberId {
    MemberId(MEMBER_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_reservation_id() -> ReservationId {
    ReservationId(RESERVATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_rating_id() -> RatingId {
    RatingId(RATING_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Per-key mutexes serializing check-then-write sequences. Locks are never dropped
/// from the table; the key space is bounded by the number of live records.
struct KeyedLocks<K> {
    inner: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    fn acquire(&self, key: &K) -> Arc<Mutex<()>> {
        let mut guard = self.inner.lock().expect("lock table poisoned");
        guard.entry(key.clone()).or_default().clone()
    }
}

/// Error raised by the accommodation service.
#[derive(Debug, thiserror::Error)]
pub enum AccommodationServiceError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("unknown reference point '{name}'")]
    UnknownReferencePoint { name: String },
}

/// Orchestrates geocoding and distance precomputation around accommodation saves.
pub struct AccommodationService<S, G> {
    store: Arc<S>,
    resolver: Arc<G>,
    campuses: ReferenceTable,
}

impl<S, G> AccommodationService<S, G>
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    pub fn new(store: Arc<S>, resolver: Arc<G>, campuses: ReferenceTable) -> Self {
        Self {
            store,
            resolver,
            campuses,
        }
    }

    pub fn reference_points(&self) -> &ReferenceTable {
        &self.campuses
    }

    /// Resolve the address and derive the full distance table. Runs before any
    /// write so a lookup failure leaves storage untouched.
    async fn resolve_location(
        &self,
        address: &str,
    ) -> Result<ResolvedLocation, AccommodationServiceError> {
        let coordinate = self.resolver.resolve(address).await?;
        Ok(ResolvedLocation {
            coordinate,
            campus_distances_km: self.campuses.distances_from(coordinate),
        })
    }

    pub async fn create(
        &self,
        draft: AccommodationDraft,
    ) -> Result<Accommodation, AccommodationServiceError> {
        let location = self.resolve_location(&draft.address).await?;
        let record = Accommodation {
            id: next_accommodation_id(),
            address: draft.address,
            building_name: draft.building_name,
            floor_number: draft.floor_number,
            flat_number: draft.flat_number,
            room_number: draft.room_number,
            availability_start: draft.availability_start,
            availability_end: draft.availability_end,
            monthly_rent: draft.monthly_rent,
            capacity: draft.capacity,
            managed_by: draft.managed_by,
            active: draft.active,
            location,
        };
        Ok(self.store.insert_accommodation(record)?)
    }

    /// Every update re-resolves the address and recomputes every distance; there is
    /// no short-circuit for unchanged addresses.
    pub async fn update(
        &self,
        id: &AccommodationId,
        draft: AccommodationDraft,
    ) -> Result<Accommodation, AccommodationServiceError> {
        let existing = self
            .store
            .fetch_accommodation(id)?
            .ok_or(RepositoryError::NotFound)?;
        let location = self.resolve_location(&draft.address).await?;
        let record = Accommodation {
            id: existing.id,
            address: draft.address,
            building_name: draft.building_name,
            floor_number: draft.floor_number,
            flat_number: draft.flat_number,
            room_number: draft.room_number,
            availability_start: draft.availability_start,
            availability_end: draft.availability_end,
            monthly_rent: draft.monthly_rent,
            capacity: draft.capacity,
            managed_by: draft.managed_by,
            active: draft.active,
            location,
        };
        self.store.update_accommodation(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &AccommodationId) -> Result<Accommodation, AccommodationServiceError> {
        Ok(self
            .store
            .fetch_accommodation(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    pub fn list(&self) -> Result<Vec<Accommodation>, AccommodationServiceError> {
        Ok(self.store.list_accommodations()?)
    }

    pub fn delete(&self, id: &AccommodationId) -> Result<(), AccommodationServiceError> {
        Ok(self.store.remove_accommodation(id)?)
    }

    /// Accommodations ordered by the precomputed distance to one reference point.
    /// Ties keep insertion (id) order in either direction; the sort is stable over
    /// the id-ordered listing.
    pub fn rank_by_distance(
        &self,
        campus: &str,
        descending: bool,
    ) -> Result<Vec<Accommodation>, AccommodationServiceError> {
        if !self.campuses.contains(campus) {
            return Err(AccommodationServiceError::UnknownReferencePoint {
                name: campus.to_string(),
            });
        }

        let mut records = self.store.list_accommodations()?;
        records.sort_by(|a, b| {
            let left = distance_for(a, campus);
            let right = distance_for(b, campus);
            let ordering = left.partial_cmp(&right).unwrap_or(CmpOrdering::Equal);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(records)
    }
}

fn distance_for(record: &Accommodation, campus: &str) -> f64 {
    record
        .location
        .campus_distances_km
        .get(campus)
        .copied()
        .unwrap_or(f64::INFINITY)
}

/// Plain CRUD over members.
pub struct MemberService<S> {
    store: Arc<S>,
}

impl<S: HousingRepository + 'static> MemberService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, draft: MemberDraft) -> Result<Member, RepositoryError> {
        let record = Member {
            id: next_member_id(),
            name: draft.name,
            contact: draft.contact,
            institute: draft.institute,
            email: draft.email,
            active: draft.active,
        };
        self.store.insert_member(record)
    }

    pub fn update(&self, id: &MemberId, draft: MemberDraft) -> Result<Member, RepositoryError> {
        let existing = self.store.fetch_member(id)?.ok_or(RepositoryError::NotFound)?;
        let record = Member {
            id: existing.id,
            name: draft.name,
            contact: draft.contact,
            institute: draft.institute,
            email: draft.email,
            active: draft.active,
        };
        self.store.update_member(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &MemberId) -> Result<Member, RepositoryError> {
        self.store.fetch_member(id)?.ok_or(RepositoryError::NotFound)
    }

    pub fn list(&self) -> Result<Vec<Member>, RepositoryError> {
        self.store.list_members()
    }

    pub fn delete(&self, id: &MemberId) -> Result<(), RepositoryError> {
        self.store.remove_member(id)
    }
}

/// Error raised by the reservation service.
#[derive(Debug, thiserror::Error)]
pub enum ReservationServiceError {
    #[error(transparent)]
    Violation(#[from] ReservationViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("accommodation {0} does not exist")]
    UnknownAccommodation(AccommodationId),
    #[error("member {0} does not exist")]
    UnknownMember(MemberId),
}

/// Validates and persists reservations, serializing writes per accommodation so two
/// concurrent saves cannot both pass the overlap check against a stale snapshot.
pub struct ReservationService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    locks: KeyedLocks<AccommodationId>,
}

impl<S, N> ReservationService<S, N>
where
    S: HousingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            store,
            notifier,
            locks: KeyedLocks::default(),
        }
    }

    pub fn create(&self, draft: ReservationDraft) -> Result<Reservation, ReservationServiceError> {
        if self.store.fetch_accommodation(&draft.accommodation)?.is_none() {
            return Err(ReservationServiceError::UnknownAccommodation(
                draft.accommodation,
            ));
        }
        if self.store.fetch_member(&draft.member)?.is_none() {
            return Err(ReservationServiceError::UnknownMember(draft.member));
        }

        let lock = self.locks.acquire(&draft.accommodation);
        let _guard = lock.lock().expect("accommodation lock poisoned");

        let proposed = Reservation {
            id: next_reservation_id(),
            accommodation: draft.accommodation,
            member: draft.member,
            period: DatePeriod::new(draft.start_date, draft.end_date),
            status: draft.status,
            active: draft.active,
        };

        let others = self.other_active_reservations(&proposed)?;
        validate_reservation(&proposed, &others)?;

        // First save establishes the baseline; no notice fires here.
        Ok(self.store.insert_reservation(proposed)?)
    }

    pub fn update(
        &self,
        id: &ReservationId,
        change: ReservationChange,
    ) -> Result<Reservation, ReservationServiceError> {
        let current = self
            .store
            .fetch_reservation(id)?
            .ok_or(RepositoryError::NotFound)?;

        let lock = self.locks.acquire(&current.accommodation);
        let _guard = lock.lock().expect("accommodation lock poisoned");

        // Re-read under the lock so the transition check sees the committed row.
        let previous = self
            .store
            .fetch_reservation(id)?
            .ok_or(RepositoryError::NotFound)?;

        let proposed = Reservation {
            id: previous.id,
            accommodation: previous.accommodation,
            member: previous.member,
            period: DatePeriod::new(change.start_date, change.end_date),
            status: change.status,
            active: change.active,
        };

        let others = self.other_active_reservations(&proposed)?;
        validate_reservation(&proposed, &others)?;
        self.store.update_reservation(proposed.clone())?;

        if active_flag_changed(&previous, &proposed) {
            self.notify(&previous, &proposed);
        }

        Ok(proposed)
    }

    pub fn get(&self, id: &ReservationId) -> Result<Reservation, ReservationServiceError> {
        Ok(self
            .store
            .fetch_reservation(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    pub fn list(&self) -> Result<Vec<Reservation>, ReservationServiceError> {
        Ok(self.store.list_reservations()?)
    }

    pub fn list_by_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, ReservationServiceError> {
        Ok(self.store.reservations_with_status(status)?)
    }

    pub fn delete(&self, id: &ReservationId) -> Result<(), ReservationServiceError> {
        Ok(self.store.remove_reservation(id)?)
    }

    /// The overlap candidate set: active reservations on the same accommodation,
    /// excluding the proposed record by id.
    fn other_active_reservations(
        &self,
        proposed: &Reservation,
    ) -> Result<Vec<Reservation>, ReservationServiceError> {
        Ok(self
            .store
            .active_reservations_for(&proposed.accommodation)?
            .into_iter()
            .filter(|existing| existing.id != proposed.id)
            .collect())
    }

    /// Delivery failures are logged and swallowed; the save already committed.
    fn notify(&self, previous: &Reservation, current: &Reservation) {
        let recipient = match self.store.fetch_member(&current.member) {
            Ok(Some(member)) => member.email,
            Ok(None) => {
                warn!(member = %current.member, "member missing, skipping reservation notice");
                return;
            }
            Err(err) => {
                warn!(error = %err, "could not load member for reservation notice");
                return;
            }
        };

        let notice = ReservationNotice {
            recipient,
            accommodation: current.accommodation,
            reservation: current.id,
            period: current.period,
            previous_active: previous.active,
            active: current.active,
        };

        if let Err(err) = self.notifier.publish(notice) {
            warn!(error = %err, reservation = %current.id, "reservation notice delivery failed");
        }
    }
}

/// Error raised by the rating service.
#[derive(Debug, thiserror::Error)]
pub enum RatingServiceError {
    #[error(transparent)]
    Violation(#[from] RatingViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("accommodation {0} does not exist")]
    UnknownAccommodation(AccommodationId),
    #[error("member {0} does not exist")]
    UnknownMember(MemberId),
}

/// Gates rating inserts on a completed stay and pair uniqueness; the check and the
/// insert run under one per-(accommodation, member) lock.
pub struct RatingService<S> {
    store: Arc<S>,
    locks: KeyedLocks<(AccommodationId, MemberId)>,
}

impl<S: HousingRepository + 'static> RatingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: KeyedLocks::default(),
        }
    }

    pub fn create(
        &self,
        draft: RatingDraft,
        today: NaiveDate,
    ) -> Result<Rating, RatingServiceError> {
        eligibility::validate_value(draft.rating)?;

        if self.store.fetch_accommodation(&draft.accommodation)?.is_none() {
            return Err(RatingServiceError::UnknownAccommodation(draft.accommodation));
        }
        if self.store.fetch_member(&draft.member)?.is_none() {
            return Err(RatingServiceError::UnknownMember(draft.member));
        }

        let key = (draft.accommodation, draft.member);
        let lock = self.locks.acquire(&key);
        let _guard = lock.lock().expect("rating lock poisoned");

        let history = self
            .store
            .reservations_for_pair(&draft.accommodation, &draft.member)?;
        if !eligibility::can_rate(&history, today) {
            return Err(RatingViolation::NoCompletedStay.into());
        }

        if self
            .store
            .rating_for_pair(&draft.accommodation, &draft.member)?
            .is_some()
        {
            return Err(RatingViolation::DuplicateRating.into());
        }

        let record = Rating {
            id: next_rating_id(),
            accommodation: draft.accommodation,
            member: draft.member,
            rating: draft.rating,
            comment: draft.comment,
            active: draft.active,
        };
        Ok(self.store.insert_rating(record)?)
    }

    /// Re-rating updates the existing row; eligibility was established at insert.
    pub fn update(&self, id: &RatingId, change: RatingChange) -> Result<Rating, RatingServiceError> {
        eligibility::validate_value(change.rating)?;

        let existing = self.store.fetch_rating(id)?.ok_or(RepositoryError::NotFound)?;
        let record = Rating {
            id: existing.id,
            accommodation: existing.accommodation,
            member: existing.member,
            rating: change.rating,
            comment: change.comment,
            active: change.active,
        };
        self.store.update_rating(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &RatingId) -> Result<Rating, RatingServiceError> {
        Ok(self.store.fetch_rating(id)?.ok_or(RepositoryError::NotFound)?)
    }

    pub fn list(&self) -> Result<Vec<Rating>, RatingServiceError> {
        Ok(self.store.list_ratings()?)
    }

    pub fn delete(&self, id: &RatingId) -> Result<(), RatingServiceError> {
        Ok(self.store.remove_rating(id)?)
    }

    /// Ratings ordered by value, descending by default; ties break toward the most
    /// recently created (descending id) in either direction.
    pub fn rank_by_rating(&self, descending: bool) -> Result<Vec<Rating>, RatingServiceError> {
        let mut records = self.store.list_ratings()?;
        records.sort_by(|a, b| {
            let ordering = if descending {
                b.rating.cmp(&a.rating)
            } else {
                a.rating.cmp(&b.rating)
            };
            ordering.then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }
}
