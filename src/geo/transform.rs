//! Conversion from the HK1980 grid (the projected reference system returned by the
//! address lookup service) to WGS84 geographic coordinates.
//!
//! Inverse transverse Mercator on the International 1924 ellipsoid with the HK1980
//! grid parameters, followed by the published approximate HK80 -> WGS84 datum shift
//! (-5.5 arc seconds latitude, +8.8 arc seconds longitude).

use super::Coordinate;

// International 1924 ellipsoid.
const SEMI_MAJOR_M: f64 = 6_378_388.0;
const FLATTENING: f64 = 1.0 / 297.0;

// HK1980 grid.
const FALSE_EASTING_M: f64 = 836_694.05;
const FALSE_NORTHING_M: f64 = 819_069.80;
const ORIGIN_LATITUDE_DEG: f64 = 22.0 + 18.0 / 60.0 + 43.68 / 3600.0;
const ORIGIN_LONGITUDE_DEG: f64 = 114.0 + 10.0 / 60.0 + 42.80 / 3600.0;
const SCALE_FACTOR: f64 = 1.0;

// Approximate HK80 geodetic -> WGS84 shift.
const LATITUDE_SHIFT_DEG: f64 = -5.5 / 3600.0;
const LONGITUDE_SHIFT_DEG: f64 = 8.8 / 3600.0;

/// Convert HK1980 grid easting/northing (metres) to a WGS84 coordinate.
pub fn hk1980_to_wgs84(easting: f64, northing: f64) -> Coordinate {
    let e2 = 2.0 * FLATTENING - FLATTENING * FLATTENING;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    // Footpoint latitude from the meridian arc at the target northing.
    let m0 = meridian_arc(ORIGIN_LATITUDE_DEG.to_radians(), e2, e4, e6);
    let m = m0 + (northing - FALSE_NORTHING_M) / SCALE_FACTOR;
    let mu = m / (SEMI_MAJOR_M * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let footpoint = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_fp = footpoint.sin();
    let cos_fp = footpoint.cos();
    let tan_fp = footpoint.tan();

    let c1 = ep2 * cos_fp * cos_fp;
    let t1 = tan_fp * tan_fp;
    let n1 = SEMI_MAJOR_M / (1.0 - e2 * sin_fp * sin_fp).sqrt();
    let r1 = SEMI_MAJOR_M * (1.0 - e2) / (1.0 - e2 * sin_fp * sin_fp).powf(1.5);
    let d = (easting - FALSE_EASTING_M) / (n1 * SCALE_FACTOR);

    let latitude = footpoint
        - (n1 * tan_fp / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let longitude = ORIGIN_LONGITUDE_DEG.to_radians()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_fp;

    Coordinate::new(
        latitude.to_degrees() + LATITUDE_SHIFT_DEG,
        longitude.to_degrees() + LONGITUDE_SHIFT_DEG,
    )
}

fn meridian_arc(latitude: f64, e2: f64, e4: f64, e6: f64) -> f64 {
    SEMI_MAJOR_M
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * latitude
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * latitude).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * latitude).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * latitude).sin())
}
