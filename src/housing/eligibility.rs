//! Rating eligibility rules: value bounds, the completed-stay requirement, and
//! one-rating-per-(accommodation, member).

use chrono::NaiveDate;

use super::domain::Reservation;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum RatingViolation {
    #[error("rating {value} is outside the allowed range {MIN_RATING}..={MAX_RATING}")]
    InvalidRatingValue { value: u8 },
    #[error("no completed stay for this member at this accommodation")]
    NoCompletedStay,
    #[error("this member has already rated this accommodation")]
    DuplicateRating,
}

pub fn validate_value(value: u8) -> Result<(), RatingViolation> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(RatingViolation::InvalidRatingValue { value })
    }
}

/// A member may rate only after an active reservation for the exact pair ended
/// strictly before `today`. `history` is the member's reservations on the
/// accommodation being rated.
pub fn can_rate(history: &[Reservation], today: NaiveDate) -> bool {
    history
        .iter()
        .any(|reservation| reservation.active && reservation.period.end < today)
}
