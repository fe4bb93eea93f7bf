//! Great-circle distances between coordinates and the fixed table of campus
//! reference points that accommodation distances are precomputed against.

use std::collections::BTreeMap;

use super::Coordinate;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Round to `figures` significant figures (not decimal places).
pub fn round_to_significant(value: f64, figures: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }

    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(figures - 1 - magnitude);
    (value * factor).round() / factor
}

/// A fixed named coordinate accommodations are ranked against.
#[derive(Debug, Clone)]
pub struct ReferencePoint {
    pub name: &'static str,
    pub coordinate: Coordinate,
}

/// The table of reference points used when resolving an accommodation.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    points: Vec<ReferencePoint>,
}

impl ReferenceTable {
    pub fn new(points: Vec<ReferencePoint>) -> Self {
        Self { points }
    }

    /// The university campus sites distances are published for.
    pub fn campus_sites() -> Self {
        Self::new(vec![
            ReferencePoint {
                name: "Main Campus",
                coordinate: Coordinate::new(22.28405, 114.13784),
            },
            ReferencePoint {
                name: "Sassoon Road Campus",
                coordinate: Coordinate::new(22.26750, 114.12881),
            },
            ReferencePoint {
                name: "Swire Institute of Marine Science",
                coordinate: Coordinate::new(22.20805, 114.26021),
            },
            ReferencePoint {
                name: "Kadoorie Centre",
                coordinate: Coordinate::new(22.43022, 114.11429),
            },
            ReferencePoint {
                name: "Faculty of Dentistry",
                coordinate: Coordinate::new(22.28649, 114.14426),
            },
        ])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.points.iter().any(|point| point.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.points.iter().map(|point| point.name)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// One distance entry per reference point, each rounded to 4 significant figures.
    pub fn distances_from(&self, origin: Coordinate) -> BTreeMap<String, f64> {
        self.points
            .iter()
            .map(|point| {
                let km = distance_km(origin, point.coordinate);
                (point.name.to_string(), round_to_significant(km, 4))
            })
            .collect()
    }
}
