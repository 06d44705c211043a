//! Choix du moteur de reprojection : PROJ si compilé, reproject_lite sinon

use super::ReprojectorLite;
use anyhow::{bail, Result};
use geo::{Coord, MapCoords};
use osmnet::Crs;

/// Moteur de reprojection retenu pour une paire de Crs
///
/// Avec la feature `reproject`, PROJ est utilisé pour toute paire de Crs ;
/// sinon reproject_lite (pure Rust) couvre WGS84, UTM et Web Mercator.
pub enum SmartReprojector {
    /// Moteur intégré
    Lite(ReprojectorLite),
    #[cfg(feature = "reproject")]
    Proj(crate::export::reproject::Reprojector),
    /// Source et cible identiques
    Identity,
}

impl SmartReprojector {
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        if source == target {
            return Ok(Self::Identity);
        }

        #[cfg(feature = "reproject")]
        {
            let proj = crate::export::reproject::Reprojector::new(source, target)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        {
            if ReprojectorLite::is_supported(source, target) {
                return Ok(Self::Lite(ReprojectorLite::new(source, target)?));
            }

            bail!(
                "Reprojection {} -> {} is not supported without the `reproject` feature \
                 (built-in: 4326, 3857, 326xx/327xx)",
                source,
                target
            );
        }
    }

    /// Transforme une coordonnée
    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        match self {
            Self::Identity => Ok(coord),
            Self::Lite(lite) => lite.transform_coord(coord),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_coord(coord),
        }
    }

    pub fn transform_geometry<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geom.try_map_coords(|c| self.transform_coord(c))
    }

    /// Nom du moteur, pour les logs
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Lite(_) => "built-in",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "PROJ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_crs_is_identity() {
        let r = SmartReprojector::new(Crs::WGS84, Crs::WGS84).unwrap();
        assert!(matches!(r, SmartReprojector::Identity));
        let c = Coord { x: -51.2, y: -30.0 };
        assert_eq!(r.transform_coord(c).unwrap(), c);
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_builtin_engine_without_proj() {
        let r = SmartReprojector::new(Crs::WGS84, Crs::utm(22, true)).unwrap();
        assert!(matches!(r, SmartReprojector::Lite(_)));
        assert!(SmartReprojector::new(Crs::new(2154), Crs::WGS84).is_err());
    }

    #[test]
    fn test_wgs84_to_utm_and_back() {
        let utm = Crs::utm(22, true);
        let forward = SmartReprojector::new(Crs::WGS84, utm).unwrap();
        let inverse = SmartReprojector::new(utm, Crs::WGS84).unwrap();

        let c = Coord { x: -51.23, y: -30.03 };
        let projected = forward.transform_coord(c).unwrap();
        assert!((projected.x - 477824.0).abs() < 5.0, "x={}", projected.x);

        let back = inverse.transform_coord(projected).unwrap();
        assert!((back.x - c.x).abs() < 1e-6);
        assert!((back.y - c.y).abs() < 1e-6);
    }
}
