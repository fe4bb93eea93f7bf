use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Identifier wrapper for accommodations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccommodationId(pub u64);

/// Identifier wrapper for members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub u64);

/// Identifier wrapper for reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub u64);

/// Identifier wrapper for ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RatingId(pub u64);

impl fmt::Display for AccommodationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RatingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inclusive pair of dates with `start <= end` expected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DatePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Half-open overlap test: the two periods share at least one day.
    pub fn overlaps(&self, other: &DatePeriod) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for DatePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Coordinate and campus distances resolved together on every save. Holding both in
/// one value keeps a record from carrying a coordinate with stale distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    /// Reference point name -> great-circle distance in km, 4 significant figures.
    pub campus_distances_km: BTreeMap<String, f64>,
}

/// A housing unit offered to members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: AccommodationId,
    pub address: String,
    pub building_name: String,
    pub floor_number: u32,
    pub flat_number: String,
    pub room_number: Option<u32>,
    pub availability_start: NaiveDate,
    pub availability_end: NaiveDate,
    pub monthly_rent: u32,
    pub capacity: u8,
    pub managed_by: String,
    pub active: bool,
    pub location: ResolvedLocation,
}

/// Inbound accommodation fields; the resolved location is derived, never supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationDraft {
    pub address: String,
    pub building_name: String,
    pub floor_number: u32,
    pub flat_number: String,
    #[serde(default)]
    pub room_number: Option<u32>,
    pub availability_start: NaiveDate,
    pub availability_end: NaiveDate,
    pub monthly_rent: u32,
    pub capacity: u8,
    pub managed_by: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A member eligible to reserve and rate accommodations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub contact: String,
    pub institute: String,
    pub email: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub name: String,
    pub contact: String,
    pub institute: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Contract state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Signed,
    NotSigned,
}

impl ReservationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReservationStatus::Signed => "signed",
            ReservationStatus::NotSigned => "not_signed",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "signed" => Some(Self::Signed),
            "not_signed" | "notsigned" | "not-signed" => Some(Self::NotSigned),
            _ => None,
        }
    }
}

/// A stay booked by a member on an accommodation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub accommodation: AccommodationId,
    pub member: MemberId,
    pub period: DatePeriod,
    pub status: ReservationStatus,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub accommodation: AccommodationId,
    pub member: MemberId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Mutable reservation fields. The accommodation and member references are fixed at
/// creation; changing parents would move the record between lock scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationChange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    pub active: bool,
}

/// A member's rating of an accommodation, at most one per (accommodation, member).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub accommodation: AccommodationId,
    pub member: MemberId,
    pub rating: u8,
    pub comment: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDraft {
    pub accommodation: AccommodationId,
    pub member: MemberId,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub active: bool,
}

pub(crate) fn default_active() -> bool {
    true
}
