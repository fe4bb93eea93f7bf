//! Accommodation, member, reservation, and rating management: the domain records,
//! the storage and notification boundaries, the consistency validators, and the
//! services and routers composing them.

pub mod domain;
pub(crate) mod eligibility;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod validate;

#[cfg(test)]
mod tests;

pub use domain::{
    Accommodation, AccommodationDraft, AccommodationId, DatePeriod, Member, MemberDraft, MemberId,
    Rating, RatingChange, RatingDraft, RatingId, Reservation, ReservationChange, ReservationDraft,
    ReservationId, ReservationStatus, ResolvedLocation,
};
pub use eligibility::RatingViolation;
pub use memory::InMemoryHousingStore;
pub use repository::{
    HousingRepository, NotificationError, NotificationPublisher, RepositoryError,
    ReservationNotice, TracingNotifier,
};
pub use router::{accommodation_router, member_router, rating_router, reservation_router};
pub use service::{
    AccommodationService, AccommodationServiceError, MemberService, RatingService,
    RatingServiceError, ReservationService, ReservationServiceError,
};
pub use validate::ReservationViolation;
