//! Reservation state and consistency checks, run before every persist.

use chrono::NaiveDate;

use super::domain::{DatePeriod, Reservation, ReservationId, ReservationStatus};

/// Validation errors raised for a proposed reservation. Each carries the offending
/// value so the caller can correct input without another round trip.
#[derive(Debug, thiserror::Error)]
pub enum ReservationViolation {
    #[error("a signed reservation cannot be inactive")]
    SignedInactive,
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("period overlaps active reservation {existing} covering {period}")]
    OverlapConflict {
        existing: ReservationId,
        period: DatePeriod,
    },
}

/// Check a proposed reservation against the other active reservations on the same
/// accommodation. `others` must already exclude the proposed record itself; the
/// exclusion is by identity, so two distinct reservations with identical dates still
/// conflict.
pub fn validate_reservation(
    proposed: &Reservation,
    others: &[Reservation],
) -> Result<(), ReservationViolation> {
    if proposed.status == ReservationStatus::Signed && !proposed.active {
        return Err(ReservationViolation::SignedInactive);
    }

    if !proposed.period.is_ordered() {
        return Err(ReservationViolation::InvalidDateRange {
            start: proposed.period.start,
            end: proposed.period.end,
        });
    }

    // The non-overlap invariant binds pairs of active reservations; an inactive
    // proposal cannot violate it.
    if proposed.active {
        for existing in others {
            debug_assert!(existing.id != proposed.id && existing.active);
            if existing.period.overlaps(&proposed.period) {
                return Err(ReservationViolation::OverlapConflict {
                    existing: existing.id,
                    period: existing.period,
                });
            }
        }
    }

    Ok(())
}

/// Whether a save moved the active flag, i.e. a notification must fire. Creation has
/// no previous state and never notifies.
pub fn active_flag_changed(previous: &Reservation, proposed: &Reservation) -> bool {
    previous.active != proposed.active
}
