//! Reprojection via la bibliothèque PROJ (feature `reproject`)

use anyhow::{Context, Result};
use geo::{Coord, MapCoords};
use osmnet::Crs;
use proj::Proj;

/// Transformation PROJ entre deux Crs EPSG
pub struct Reprojector {
    proj: Proj,
}

impl Reprojector {
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        let proj = Proj::new_known_crs(&source.to_string(), &target.to_string(), None)
            .context(format!("PROJ cannot build a transformation {} -> {}", source, target))?;
        Ok(Self { proj })
    }

    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (x, y) = self
            .proj
            .convert((coord.x, coord.y))
            .context(format!("PROJ failed on ({}, {})", coord.x, coord.y))?;
        if !x.is_finite() || !y.is_finite() {
            anyhow::bail!("PROJ produced non-finite coordinates for ({}, {})", coord.x, coord.y);
        }
        Ok(Coord { x, y })
    }

    pub fn transform_geometry<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geom.try_map_coords(|c| self.transform_coord(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point};

    #[test]
    fn test_porto_alegre_to_utm() {
        let reprojector = Reprojector::new(Crs::WGS84, Crs::utm(22, true)).unwrap();
        let p = reprojector
            .transform_geometry(&Point::new(-51.23, -30.03))
            .unwrap();

        assert!((p.x() - 477824.0).abs() < 5.0, "x={}", p.x());
        assert!((p.y() - 6677868.0).abs() < 5.0, "y={}", p.y());
    }

    #[test]
    fn test_segment_length_is_metric() {
        let reprojector = Reprojector::new(Crs::WGS84, Crs::utm(22, true)).unwrap();
        let line = LineString::from(vec![(-51.23, -30.03), (-51.22, -30.03)]);

        let projected = reprojector.transform_geometry(&line).unwrap();

        let dx = projected.0[1].x - projected.0[0].x;
        assert!((dx - 963.0).abs() < 5.0, "dx={}", dx);
    }

    #[test]
    fn test_unknown_epsg() {
        assert!(Reprojector::new(Crs::new(99999), Crs::WGS84).is_err());
    }
}
