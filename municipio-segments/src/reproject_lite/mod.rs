//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Supporte les systèmes utilisés par le pipeline :
//! - WGS84 géographique (EPSG:4326)
//! - UTM WGS84, toutes zones (EPSG:32601-32660 au nord, 32701-32760 au sud)
//! - Web Mercator (EPSG:3857)
//!
//! Toute combinaison source/cible passe par les coordonnées géographiques.

mod ellipsoid;
mod mercator;
mod smart;
mod utm;

pub use smart::SmartReprojector;
pub use utm::zone_for;

use anyhow::{bail, Result};
use geo::{Coord, MapCoords};
use osmnet::Crs;

pub use ellipsoid::WGS84;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Crs UTM de la zone contenant une position WGS84 (degrés)
pub fn utm_crs_for(lon_deg: f64, lat_deg: f64) -> Result<Crs> {
    let (zone, south) = zone_for(lon_deg, lat_deg)?;
    Ok(Crs::utm(zone, south))
}

/// Reprojection légère entre WGS84, UTM et Web Mercator
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: Crs,
    target: Crs,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        for crs in [source, target] {
            if !Self::is_supported_crs(crs) {
                bail!(
                    "{} is not supported (expected 4326, 3857, 32601-32660 or 32701-32760)",
                    crs
                );
            }
        }
        Ok(Self { source, target })
    }

    /// Vérifie si le Crs est supporté
    pub fn is_supported_crs(crs: Crs) -> bool {
        crs == Crs::WGS84 || crs == Crs::WEB_MERCATOR || crs.utm_zone().is_some()
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: Crs, target: Crs) -> bool {
        Self::is_supported_crs(source) && Self::is_supported_crs(target)
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let geo = to_geographic(self.source, x, y)?;
        from_geographic(self.target, geo)
    }

    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (x, y) = self.transform_point(coord.x, coord.y)?;
        Ok(Coord { x, y })
    }

    /// Transforme une géométrie (toutes ses coordonnées)
    pub fn transform_geometry<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geom.try_map_coords(|c| self.transform_coord(c))
    }
}

fn to_geographic(crs: Crs, x: f64, y: f64) -> Result<Geographic> {
    if crs == Crs::WGS84 {
        if !x.is_finite() || !y.is_finite() {
            bail!("Non-finite geographic coordinates ({}, {})", x, y);
        }
        return Ok(Geographic::from_degrees(x, y));
    }
    if crs == Crs::WEB_MERCATOR {
        return mercator::web_mercator_to_geographic(x, y);
    }
    match crs.utm_zone() {
        Some((zone, south)) => utm::utm_to_geographic(x, y, zone, south),
        None => bail!("{} is not supported", crs),
    }
}

fn from_geographic(crs: Crs, geo: Geographic) -> Result<(f64, f64)> {
    if crs == Crs::WGS84 {
        return Ok(geo.to_degrees());
    }
    if crs == Crs::WEB_MERCATOR {
        return mercator::geographic_to_web_mercator(geo);
    }
    match crs.utm_zone() {
        Some((zone, south)) => utm::geographic_to_utm(geo, zone, south),
        None => bail!("{} is not supported", crs),
    }
}
