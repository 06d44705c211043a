//! Projection UTM (Universal Transverse Mercator) sur WGS84
//!
//! Formules de Snyder (USGS Professional Paper 1395), précision
//! submétrique dans la zone et ses bords immédiats.

use super::ellipsoid::WGS84;
use super::Geographic;
use anyhow::{bail, Result};

/// Facteur d'échelle au méridien central
const K0: f64 = 0.9996;

/// False easting
const X0: f64 = 500000.0;

/// False northing de l'hémisphère sud
const Y0_SOUTH: f64 = 10000000.0;

/// Latitudes couvertes par le système UTM
const MIN_LAT: f64 = -80.0;
const MAX_LAT: f64 = 84.0;

/// Longitude centrale d'une zone (radians)
fn central_meridian(zone: u8) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Détermine la zone UTM d'une position en degrés
///
/// Retourne `(zone, sud)`. Échoue hors des latitudes UTM ou pour des
/// coordonnées non finies.
pub fn zone_for(lon_deg: f64, lat_deg: f64) -> Result<(u8, bool)> {
    if !lon_deg.is_finite() || !lat_deg.is_finite() {
        bail!("Cannot determine UTM zone for non-finite position ({}, {})", lon_deg, lat_deg);
    }
    if !(-180.0..=180.0).contains(&lon_deg) {
        bail!("Longitude out of range: {}", lon_deg);
    }
    if !(MIN_LAT..=MAX_LAT).contains(&lat_deg) {
        bail!("Latitude {} is outside the UTM domain [-80, 84]", lat_deg);
    }

    let zone = (((lon_deg + 180.0) / 6.0).floor() as u8 + 1).min(60);
    Ok((zone, lat_deg < 0.0))
}

/// Arc de méridien depuis l'équateur
fn meridian_arc(lat: f64) -> f64 {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Convertit des coordonnées géographiques WGS84 vers UTM
pub fn geographic_to_utm(geo: Geographic, zone: u8, south: bool) -> Result<(f64, f64)> {
    if !(1..=60).contains(&zone) {
        bail!("Invalid UTM zone: {}", zone);
    }

    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;

    let lat = geo.lat;
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
    let t = tan_lat.powi(2);
    let c = ep2 * cos_lat.powi(2);
    let big_a = cos_lat * (geo.lon - central_meridian(zone));
    let m = meridian_arc(lat);

    let x = K0
        * n
        * (big_a
            + (1.0 - t + c) * big_a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0)
        + X0;

    let y = K0
        * (m + n
            * tan_lat
            * (big_a.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * big_a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * big_a.powi(6) / 720.0))
        + if south { Y0_SOUTH } else { 0.0 };

    if !x.is_finite() || !y.is_finite() {
        bail!("UTM projection produced non-finite coordinates");
    }

    Ok((x, y))
}

/// Convertit UTM vers coordonnées géographiques WGS84
pub fn utm_to_geographic(x: f64, y: f64, zone: u8, south: bool) -> Result<Geographic> {
    if !(1..=60).contains(&zone) {
        bail!("Invalid UTM zone: {}", zone);
    }

    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;

    // Coordonnées réduites
    let x = x - X0;
    let y = y - if south { Y0_SOUTH } else { 0.0 };

    // Calcul du footprint latitude
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    if !lon.is_finite() || !lat.is_finite() {
        bail!("UTM inverse projection produced non-finite coordinates");
    }

    Ok(Geographic::new(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_for() {
        // Porto Alegre
        assert_eq!(zone_for(-51.23, -30.03).unwrap(), (22, true));
        // Manaus
        assert_eq!(zone_for(-60.02, -3.10).unwrap(), (20, true));
        // Boa Vista (hémisphère nord)
        assert_eq!(zone_for(-60.67, 2.82).unwrap(), (20, false));
        assert_eq!(zone_for(180.0, 0.0).unwrap(), (60, false));
        assert_eq!(zone_for(-180.0, 0.0).unwrap(), (1, false));
    }

    #[test]
    fn test_zone_for_invalid() {
        assert!(zone_for(f64::NAN, -30.0).is_err());
        assert!(zone_for(-51.0, -85.0).is_err());
        assert!(zone_for(-51.0, 85.0).is_err());
        assert!(zone_for(200.0, 0.0).is_err());
    }

    #[test]
    fn test_porto_alegre_forward() {
        let geo = Geographic::from_degrees(-51.23, -30.03);
        let (x, y) = geographic_to_utm(geo, 22, true).unwrap();

        // Zone 22S : environ 477824, 6677868
        assert!((x - 477824.0).abs() < 5.0, "x={}", x);
        assert!((y - 6677868.0).abs() < 5.0, "y={}", y);
    }

    #[test]
    fn test_martinique() {
        // Fort-de-France approximativement
        // UTM Zone 20N: 708000, 1615000
        let geo = utm_to_geographic(708000.0, 1615000.0, 20, false).unwrap();
        let (lon, lat) = geo.to_degrees();

        assert!((lon - (-61.07)).abs() < 0.2, "lon={}", lon);
        assert!((lat - 14.60).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_roundtrip() {
        for (lon, lat, zone, south) in [
            (-51.23, -30.03, 22, true),
            (-47.93, -15.78, 23, true),
            (-60.67, 2.82, 20, false),
            (-48.0, -10.0, 22, true),
        ] {
            let (x, y) = geographic_to_utm(Geographic::from_degrees(lon, lat), zone, south).unwrap();
            let (lon2, lat2) = utm_to_geographic(x, y, zone, south).unwrap().to_degrees();
            assert!((lon2 - lon).abs() < 1e-6, "lon {} -> {}", lon, lon2);
            assert!((lat2 - lat).abs() < 1e-6, "lat {} -> {}", lat, lat2);
        }
    }

    #[test]
    fn test_invalid_zone() {
        assert!(geographic_to_utm(Geographic::from_degrees(0.0, 0.0), 0, false).is_err());
        assert!(utm_to_geographic(500000.0, 0.0, 61, false).is_err());
    }
}
