//! Transverse Mercator projection (UTM variant).
//!
//! Uses the Krüger series expansion on the WGS84 ellipsoid, accurate to
//! well under a millimeter within a UTM zone. Published groundwater
//! rasters use UTM zone 44N (EPSG:32644).
//!
//! The projection parameters include:
//! - Central meridian (lon0): zone * 6 - 183 degrees
//! - Scale factor on the central meridian: 0.9996
//! - False easting: 500 km; false northing: 10000 km south of the equator

use crate::ProjectionError;
use std::f64::consts::PI;

/// WGS84 semi-major axis (meters).
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM central meridian scale factor.
const UTM_K0: f64 = 0.9996;
/// UTM false easting (meters).
const FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing for the southern hemisphere (meters).
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM zone number (1-60) containing the given longitude.
pub fn utm_zone_for(lon_deg: f64) -> u8 {
    let zone = ((lon_deg + 180.0) / 6.0).floor() as i32 + 1;
    zone.clamp(1, 60) as u8
}

/// Transverse Mercator projection for one UTM zone.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian in radians
    lon0: f64,
    /// False northing applied to output (meters)
    false_northing: f64,
    /// Third flattening n = f / (2 - f)
    n: f64,
    /// Rectifying radius A
    big_a: f64,
    /// Forward series coefficients
    alpha: [f64; 3],
    /// Inverse series coefficients
    beta: [f64; 3],
    /// Conformal-to-geodetic latitude series coefficients
    delta: [f64; 3],
}

impl TransverseMercator {
    /// Projection for the given UTM zone and hemisphere.
    pub fn utm(zone: u8, north: bool) -> Self {
        let lon0_deg = zone as f64 * 6.0 - 183.0;
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;

        let big_a = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
            61.0 * n3 / 240.0,
        ];
        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
            n2 / 48.0 + n3 / 15.0,
            17.0 * n3 / 480.0,
        ];
        let delta = [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
            56.0 * n3 / 15.0,
        ];

        Self {
            lon0: lon0_deg * PI / 180.0,
            false_northing: if north { 0.0 } else { FALSE_NORTHING_SOUTH },
            n,
            big_a,
            alpha,
            beta,
            delta,
        }
    }

    /// Project geographic coordinates (degrees) to easting/northing (meters).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        if !(-84.0..=84.0).contains(&lat_deg) {
            return Err(ProjectionError::LatitudeOutOfRange(lat_deg));
        }

        let lat = lat_deg * PI / 180.0;
        let mut dlon = lon_deg * PI / 180.0 - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        // Conformal latitude
        let e = (2.0 * self.n.sqrt()) / (1.0 + self.n);
        let t = (lat.sin().atanh() - e * (e * lat.sin()).atanh()).sinh();

        let xi_p = t.atan2(dlon.cos());
        let eta_p = (dlon.sin() / (t * t + dlon.cos() * dlon.cos()).sqrt()).asinh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let easting = FALSE_EASTING + UTM_K0 * self.big_a * eta;
        let northing = self.false_northing + UTM_K0 * self.big_a * xi;
        Ok((easting, northing))
    }

    /// Unproject easting/northing (meters) to geographic coordinates (degrees).
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let xi = (northing - self.false_northing) / (UTM_K0 * self.big_a);
        let eta = (easting - FALSE_EASTING) / (UTM_K0 * self.big_a);

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }

        // Conformal latitude, then the series back to geodetic latitude
        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut lat = chi;
        for (j, d) in self.delta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            lat += d * (k * chi).sin();
        }

        let lon = self.lon0 + eta_p.sinh().atan2(xi_p.cos());

        (lon * 180.0 / PI, lat * 180.0 / PI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_lookup() {
        assert_eq!(utm_zone_for(78.5), 44);
        assert_eq!(utm_zone_for(-180.0), 1);
        assert_eq!(utm_zone_for(179.99), 60);
        assert_eq!(utm_zone_for(0.0), 31);
    }

    #[test]
    fn test_central_meridian_maps_to_false_easting() {
        let tm = TransverseMercator::utm(44, true);
        // Zone 44 central meridian is 81E
        let (e, n) = tm.forward(81.0, 15.0).unwrap();
        assert!((e - 500_000.0).abs() < 1e-6, "easting {}", e);
        assert!(n > 1_600_000.0 && n < 1_700_000.0, "northing {}", n);
    }

    #[test]
    fn test_easting_symmetric_about_central_meridian() {
        let tm = TransverseMercator::utm(44, true);
        let (e_west, _) = tm.forward(80.0, 14.0).unwrap();
        let (e_east, _) = tm.forward(82.0, 14.0).unwrap();
        assert!((e_west + e_east - 1_000_000.0).abs() < 1e-6);
        assert!(e_west < 500_000.0 && e_east > 500_000.0);
    }

    #[test]
    fn test_roundtrip_within_zone() {
        let tm = TransverseMercator::utm(44, true);
        for &(lon, lat) in &[(78.2, 13.1), (81.0, 17.9), (83.6, 15.42), (79.0, 0.5)] {
            let (e, n) = tm.forward(lon, lat).unwrap();
            let (lon2, lat2) = tm.inverse(e, n);
            assert!((lon - lon2).abs() < 1e-9, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_southern_hemisphere_false_northing() {
        let north = TransverseMercator::utm(33, true);
        let south = TransverseMercator::utm(33, false);

        let (_, n_north) = north.forward(15.0, -5.0).unwrap();
        let (_, n_south) = south.forward(15.0, -5.0).unwrap();
        assert!(n_north < 0.0);
        assert!((n_south - n_north - 10_000_000.0).abs() < 1e-6);

        let (lon, lat) = south.inverse(500_000.0, 9_000_000.0);
        assert!((lon - 15.0).abs() < 1e-9);
        assert!(lat < 0.0);
    }

    #[test]
    fn test_rejects_polar_latitudes() {
        let tm = TransverseMercator::utm(44, true);
        assert!(tm.forward(81.0, 89.0).is_err());
        assert!(tm.forward(81.0, -88.0).is_err());
    }
}
