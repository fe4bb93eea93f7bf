//! Geographic primitives: coordinates, campus distance computation, and address
//! resolution against the external lookup service.

pub mod distance;
pub mod resolver;
pub mod transform;

use serde::{Deserialize, Serialize};

/// A WGS84 geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

pub use distance::{distance_km, ReferencePoint, ReferenceTable};
pub use resolver::{AddressResolver, GeocodeError, GeodataResolver};
pub use transform::hk1980_to_wgs84;
