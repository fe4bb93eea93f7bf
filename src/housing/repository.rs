use serde::{Deserialize, Serialize};

use super::domain::{
    Accommodation, AccommodationId, DatePeriod, Member, MemberId, Rating, RatingId, Reservation,
    ReservationId, ReservationStatus,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for the housing records. Any engine supporting equality and
/// range filtering suffices; the in-memory implementation backs the server and tests.
///
/// Removing an accommodation or member cascades to its reservations and ratings.
pub trait HousingRepository: Send + Sync {
    fn insert_accommodation(&self, record: Accommodation)
        -> Result<Accommodation, RepositoryError>;
    fn update_accommodation(&self, record: Accommodation) -> Result<(), RepositoryError>;
    fn fetch_accommodation(
        &self,
        id: &AccommodationId,
    ) -> Result<Option<Accommodation>, RepositoryError>;
    /// All accommodations in insertion (id) order.
    fn list_accommodations(&self) -> Result<Vec<Accommodation>, RepositoryError>;
    fn remove_accommodation(&self, id: &AccommodationId) -> Result<(), RepositoryError>;

    fn insert_member(&self, record: Member) -> Result<Member, RepositoryError>;
    fn update_member(&self, record: Member) -> Result<(), RepositoryError>;
    fn fetch_member(&self, id: &MemberId) -> Result<Option<Member>, RepositoryError>;
    fn list_members(&self) -> Result<Vec<Member>, RepositoryError>;
    fn remove_member(&self, id: &MemberId) -> Result<(), RepositoryError>;

    fn insert_reservation(&self, record: Reservation) -> Result<Reservation, RepositoryError>;
    fn update_reservation(&self, record: Reservation) -> Result<(), RepositoryError>;
    fn fetch_reservation(
        &self,
        id: &ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError>;
    fn list_reservations(&self) -> Result<Vec<Reservation>, RepositoryError>;
    fn remove_reservation(&self, id: &ReservationId) -> Result<(), RepositoryError>;
    /// Active reservations on one accommodation, the set overlap checks run against.
    fn active_reservations_for(
        &self,
        id: &AccommodationId,
    ) -> Result<Vec<Reservation>, RepositoryError>;
    /// Every reservation for an exact (accommodation, member) pair.
    fn reservations_for_pair(
        &self,
        accommodation: &AccommodationId,
        member: &MemberId,
    ) -> Result<Vec<Reservation>, RepositoryError>;
    fn reservations_with_status(
        &self,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    fn insert_rating(&self, record: Rating) -> Result<Rating, RepositoryError>;
    fn update_rating(&self, record: Rating) -> Result<(), RepositoryError>;
    fn fetch_rating(&self, id: &RatingId) -> Result<Option<Rating>, RepositoryError>;
    fn list_ratings(&self) -> Result<Vec<Rating>, RepositoryError>;
    fn remove_rating(&self, id: &RatingId) -> Result<(), RepositoryError>;
    fn rating_for_pair(
        &self,
        accommodation: &AccommodationId,
        member: &MemberId,
    ) -> Result<Option<Rating>, RepositoryError>;
}

/// Event emitted when a saved reservation's active flag changed. Exactly one per
/// save in which the flag flipped; none on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationNotice {
    pub recipient: String,
    pub accommodation: AccommodationId,
    pub reservation: ReservationId,
    pub period: DatePeriod,
    pub previous_active: bool,
    pub active: bool,
}

impl ReservationNotice {
    pub fn status_label(&self) -> &'static str {
        if self.active {
            "Active"
        } else {
            "Inactive"
        }
    }

    fn label_for(active: bool) -> &'static str {
        if active {
            "Active"
        } else {
            "Inactive"
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "Reservation {} is now {}",
            self.reservation,
            self.status_label()
        )
    }

    pub fn body(&self) -> String {
        format!(
            "Your reservation for accommodation {} covering {} changed from {} to {}.",
            self.accommodation,
            self.period,
            Self::label_for(self.previous_active),
            self.status_label()
        )
    }
}

/// Outbound delivery hook (e.g. an email adapter). Delivery failures are logged by
/// the caller and never roll back the committed save.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: ReservationNotice) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Publisher that records the transition in the log; the transport is external.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl NotificationPublisher for TracingNotifier {
    fn publish(&self, notice: ReservationNotice) -> Result<(), NotificationError> {
        tracing::info!(
            recipient = %notice.recipient,
            reservation = %notice.reservation,
            accommodation = %notice.accommodation,
            status = notice.status_label(),
            "reservation status notice"
        );
        Ok(())
    }
}
