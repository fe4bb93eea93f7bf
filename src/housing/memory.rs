//! In-memory store backing the server and tests. One mutex guards the whole state;
//! parent deletes cascade the way a foreign key with `ON DELETE CASCADE` would.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::domain::{
    Accommodation, AccommodationId, Member, MemberId, Rating, RatingId, Reservation,
    ReservationId, ReservationStatus,
};
use super::repository::{HousingRepository, RepositoryError};

#[derive(Debug, Default)]
struct StoreState {
    accommodations: BTreeMap<u64, Accommodation>,
    members: BTreeMap<u64, Member>,
    reservations: BTreeMap<u64, Reservation>,
    ratings: BTreeMap<u64, Rating>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryHousingStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryHousingStore {
    fn with_state<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        let mut guard = self.state.lock().expect("store mutex poisoned");
        f(&mut guard)
    }
}

fn insert_new<T: Clone>(
    table: &mut BTreeMap<u64, T>,
    id: u64,
    record: T,
) -> Result<T, RepositoryError> {
    if table.contains_key(&id) {
        return Err(RepositoryError::Conflict);
    }
    table.insert(id, record.clone());
    Ok(record)
}

fn replace_existing<T>(
    table: &mut BTreeMap<u64, T>,
    id: u64,
    record: T,
) -> Result<(), RepositoryError> {
    if !table.contains_key(&id) {
        return Err(RepositoryError::NotFound);
    }
    table.insert(id, record);
    Ok(())
}

impl HousingRepository for InMemoryHousingStore {
    fn insert_accommodation(
        &self,
        record: Accommodation,
    ) -> Result<Accommodation, RepositoryError> {
        self.with_state(|state| insert_new(&mut state.accommodations, record.id.0, record))
    }

    fn update_accommodation(&self, record: Accommodation) -> Result<(), RepositoryError> {
        self.with_state(|state| replace_existing(&mut state.accommodations, record.id.0, record))
    }

    fn fetch_accommodation(
        &self,
        id: &AccommodationId,
    ) -> Result<Option<Accommodation>, RepositoryError> {
        self.with_state(|state| Ok(state.accommodations.get(&id.0).cloned()))
    }

    fn list_accommodations(&self) -> Result<Vec<Accommodation>, RepositoryError> {
        self.with_state(|state| Ok(state.accommodations.values().cloned().collect()))
    }

    fn remove_accommodation(&self, id: &AccommodationId) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            state
                .accommodations
                .remove(&id.0)
                .ok_or(RepositoryError::NotFound)?;
            state
                .reservations
                .retain(|_, reservation| reservation.accommodation != *id);
            state.ratings.retain(|_, rating| rating.accommodation != *id);
            Ok(())
        })
    }

    fn insert_member(&self, record: Member) -> Result<Member, RepositoryError> {
        self.with_state(|state| insert_new(&mut state.members, record.id.0, record))
    }

    fn update_member(&self, record: Member) -> Result<(), RepositoryError> {
        self.with_state(|state| replace_existing(&mut state.members, record.id.0, record))
    }

    fn fetch_member(&self, id: &MemberId) -> Result<Option<Member>, RepositoryError> {
        self.with_state(|state| Ok(state.members.get(&id.0).cloned()))
    }

    fn list_members(&self) -> Result<Vec<Member>, RepositoryError> {
        self.with_state(|state| Ok(state.members.values().cloned().collect()))
    }

    fn remove_member(&self, id: &MemberId) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            state.members.remove(&id.0).ok_or(RepositoryError::NotFound)?;
            state
                .reservations
                .retain(|_, reservation| reservation.member != *id);
            state.ratings.retain(|_, rating| rating.member != *id);
            Ok(())
        })
    }

    fn insert_reservation(&self, record: Reservation) -> Result<Reservation, RepositoryError> {
        self.with_state(|state| insert_new(&mut state.reservations, record.id.0, record))
    }

    fn update_reservation(&self, record: Reservation) -> Result<(), RepositoryError> {
        self.with_state(|state| replace_existing(&mut state.reservations, record.id.0, record))
    }

    fn fetch_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        self.with_state(|state| Ok(state.reservations.get(&id.0).cloned()))
    }

    fn list_reservations(&self) -> Result<Vec<Reservation>, RepositoryError> {
        self.with_state(|state| Ok(state.reservations.values().cloned().collect()))
    }

    fn remove_reservation(&self, id: &ReservationId) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            state
                .reservations
                .remove(&id.0)
                .ok_or(RepositoryError::NotFound)
                .map(|_| ())
        })
    }

    fn active_reservations_for(
        &self,
        id: &AccommodationId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .reservations
                .values()
                .filter(|reservation| reservation.accommodation == *id && reservation.active)
                .cloned()
                .collect())
        })
    }

    fn reservations_for_pair(
        &self,
        accommodation: &AccommodationId,
        member: &MemberId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .reservations
                .values()
                .filter(|reservation| {
                    reservation.accommodation == *accommodation && reservation.member == *member
                })
                .cloned()
                .collect())
        })
    }

    fn reservations_with_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .reservations
                .values()
                .filter(|reservation| reservation.status == status)
                .cloned()
                .collect())
        })
    }

    fn insert_rating(&self, record: Rating) -> Result<Rating, RepositoryError> {
        self.with_state(|state| insert_new(&mut state.ratings, record.id.0, record))
    }

    fn update_rating(&self, record: Rating) -> Result<(), RepositoryError> {
        self.with_state(|state| replace_existing(&mut state.ratings, record.id.0, record))
    }

    fn fetch_rating(&self, id: &RatingId) -> Result<Option<Rating>, RepositoryError> {
        self.with_state(|state| Ok(state.ratings.get(&id.0).cloned()))
    }

    fn list_ratings(&self) -> Result<Vec<Rating>, RepositoryError> {
        self.with_state(|state| Ok(state.ratings.values().cloned().collect()))
    }

    fn remove_rating(&self, id: &RatingId) -> Result<(), RepositoryError> {
        self.with_state(|state| {
            state
                .ratings
                .remove(&id.0)
                .ok_or(RepositoryError::NotFound)
                .map(|_| ())
        })
    }

    fn rating_for_pair(
        &self,
        accommodation: &AccommodationId,
        member: &MemberId,
    ) -> Result<Option<Rating>, RepositoryError> {
        self.with_state(|state| {
            Ok(state
                .ratings
                .values()
                .find(|rating| rating.accommodation == *accommodation && rating.member == *member)
                .cloned())
        })
    }
}
