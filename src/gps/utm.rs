//! Geodetic to UTM projection (WGS-84).
//!
//! Series expansion of the transverse Mercator projection, accurate to well
//! under a meter inside a zone. Zone numbers include the southern Norway and
//! Svalbard exceptions.

/// WGS-84 semi-major axis (meters)
const EQUATORIAL_RADIUS: f64 = 6_378_137.0;
/// WGS-84 first eccentricity squared
const ECC_SQUARED: f64 = 0.006_694_38;
/// UTM central meridian scale factor
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude band letters from 80°S, 8° per band (X spans 12°)
const BAND_LETTERS: &[u8; 20] = b"CDEFGHJKLMNPQRSTUVWX";

/// Position projected onto a UTM zone
#[derive(Debug, Clone, PartialEq)]
pub struct UtmCoordinate {
    pub northing: f64,
    pub easting: f64,
    pub zone_number: u8,
    /// Latitude band, 'Z' outside the UTM latitude limits
    pub band: char,
}

impl UtmCoordinate {
    /// Zone identifier such as "33U"
    pub fn zone(&self) -> String {
        format!("{}{}", self.zone_number, self.band)
    }
}

/// Project latitude/longitude (degrees) to UTM
pub fn project(latitude: f64, longitude: f64) -> UtmCoordinate {
    // Longitude normalized into [-180, 180)
    let lon = (longitude + 180.0) - ((longitude + 180.0) / 360.0).trunc() * 360.0 - 180.0;

    let zone_number = zone_number(latitude, lon);
    let lon_origin = (zone_number as f64 - 1.0) * 6.0 - 180.0 + 3.0;

    let lat_rad = latitude.to_radians();
    let lon_rad = lon.to_radians();
    let lon_origin_rad = lon_origin.to_radians();

    let e2 = ECC_SQUARED;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ecc_prime_squared = e2 / (1.0 - e2);

    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let tan_lat = lat_rad.tan();

    let n = EQUATORIAL_RADIUS / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = ecc_prime_squared * cos_lat * cos_lat;
    let a = cos_lat * (lon_rad - lon_origin_rad);

    let m = EQUATORIAL_RADIUS
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat_rad
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat_rad).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat_rad).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat_rad).sin());

    let easting = K0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ecc_prime_squared) * a.powi(5)
                / 120.0)
        + FALSE_EASTING;

    let mut northing = K0
        * (m + n
            * tan_lat
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ecc_prime_squared)
                    * a.powi(6)
                    / 720.0));
    if latitude < 0.0 {
        northing += FALSE_NORTHING_SOUTH;
    }

    UtmCoordinate {
        northing,
        easting,
        zone_number,
        band: band_letter(latitude),
    }
}

fn zone_number(latitude: f64, lon: f64) -> u8 {
    let mut zone = ((lon + 180.0) / 6.0) as u8 + 1;

    // Southern Norway
    if (56.0..64.0).contains(&latitude) && (3.0..12.0).contains(&lon) {
        zone = 32;
    }

    // Svalbard
    if (72.0..84.0).contains(&latitude) {
        zone = match lon {
            l if (0.0..9.0).contains(&l) => 31,
            l if (9.0..21.0).contains(&l) => 33,
            l if (21.0..33.0).contains(&l) => 35,
            l if (33.0..42.0).contains(&l) => 37,
            _ => zone,
        };
    }

    zone
}

fn band_letter(latitude: f64) -> char {
    if !(-80.0..=84.0).contains(&latitude) {
        return 'Z';
    }
    let index = (((latitude + 80.0) / 8.0) as usize).min(BAND_LETTERS.len() - 1);
    BAND_LETTERS[index] as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_central_meridian_on_equator() {
        let utm = project(0.0, 3.0);
        assert_abs_diff_eq!(utm.easting, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(utm.northing, 0.0, epsilon = 1e-6);
        assert_eq!(utm.zone(), "31N");
    }

    #[test]
    fn test_northern_hemisphere() {
        let utm = project(40.689247, -74.044502);
        assert_eq!(utm.zone(), "18T");
        assert_abs_diff_eq!(utm.easting, 580_735.645, epsilon = 0.01);
        assert_abs_diff_eq!(utm.northing, 4_504_700.381, epsilon = 0.01);

        let utm = project(48.8584, 2.2945);
        assert_eq!(utm.zone(), "31U");
        assert_abs_diff_eq!(utm.easting, 448_252.001, epsilon = 0.01);
        assert_abs_diff_eq!(utm.northing, 5_411_954.910, epsilon = 0.01);
    }

    #[test]
    fn test_southern_hemisphere_false_northing() {
        let utm = project(-33.8568, 151.2153);
        assert_eq!(utm.zone(), "56H");
        assert_abs_diff_eq!(utm.easting, 334_900.570, epsilon = 0.01);
        assert_abs_diff_eq!(utm.northing, 6_252_288.753, epsilon = 0.01);
    }

    #[test]
    fn test_zone_exceptions() {
        // Southern Norway widens zone 32
        let utm = project(60.0, 5.0);
        assert_eq!(utm.zone_number, 32);
        assert_eq!(utm.band, 'V');

        // Svalbard
        let utm = project(78.0, 15.0);
        assert_eq!(utm.zone(), "33X");
        assert_abs_diff_eq!(utm.easting, 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_band_limits() {
        assert_eq!(band_letter(84.0), 'X');
        assert_eq!(band_letter(-80.0), 'C');
        assert_eq!(band_letter(85.0), 'Z');
        assert_eq!(band_letter(-81.0), 'Z');
    }

    #[test]
    fn test_longitude_normalization() {
        let a = project(10.0, 190.0);
        let b = project(10.0, -170.0);
        assert_eq!(a, b);
    }
}
