//! Projection Web Mercator (EPSG:3857)
//!
//! Utilisée en repli pour le buffer quand la zone UTM ne peut être déterminée.

use super::ellipsoid::WGS84;
use super::Geographic;
use anyhow::{bail, Result};

/// Convertit coordonnées géographiques vers Web Mercator (EPSG:3857)
pub fn geographic_to_web_mercator(geo: Geographic) -> Result<(f64, f64)> {
    // Web Mercator utilise un modèle sphérique avec le rayon équatorial
    let r = WGS84::A;

    // Limiter la latitude pour éviter l'infini
    let lat = geo.lat.clamp(-85.0_f64.to_radians(), 85.0_f64.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();

    if !x.is_finite() || !y.is_finite() {
        bail!("Web Mercator projection produced non-finite coordinates");
    }
    Ok((x, y))
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Result<Geographic> {
    let r = WGS84::A;

    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    if !lon.is_finite() || !lat.is_finite() {
        bail!("Web Mercator inverse produced non-finite coordinates");
    }
    Ok(Geographic::new(lon, lat))
}
