//! Buffer métrique des limites municipales
//!
//! Le polygone WGS84 est projeté dans la zone UTM de son centroïde, agrandi
//! de la distance demandée puis reprojeté en WGS84.

use anyhow::{bail, Context, Result};
use geo::{Buffer, Centroid, MultiPolygon};
use tracing::{debug, warn};

use osmnet::{BoundaryPolygon, Crs, PipelineError};

use crate::reproject_lite::{utm_crs_for, SmartReprojector};

/// Agrandit `boundary` de `distance_meters`
///
/// Identité quand la distance est nulle ou négative. Avec
/// `mercator_fallback`, un échec de la route UTM est rattrapé par un buffer
/// en Web Mercator (distances déformées hors de l'équateur).
///
/// # Errors
///
/// `PipelineError::BufferProjection` si la zone UTM ne peut être déterminée
/// ou si une reprojection échoue.
pub fn apply_buffer(
    boundary: BoundaryPolygon,
    distance_meters: f64,
    mercator_fallback: bool,
) -> Result<BoundaryPolygon, PipelineError> {
    if distance_meters.is_nan() || distance_meters <= 0.0 {
        return Ok(boundary);
    }
    if boundary.crs != Crs::WGS84 {
        return Err(PipelineError::BufferProjection(format!(
            "boundary must be in {}, got {}",
            Crs::WGS84,
            boundary.crs
        )));
    }

    let utm = metric_crs(&boundary.geometry)
        .and_then(|crs| buffer_in(&boundary.geometry, crs, distance_meters));

    let geometry = match utm {
        Ok(geometry) => geometry,
        Err(e) if mercator_fallback => {
            warn!(error = %e, "UTM buffer failed, retrying in Web Mercator");
            buffer_in(&boundary.geometry, Crs::WEB_MERCATOR, distance_meters)
                .map_err(|e| PipelineError::BufferProjection(format!("{:#}", e)))?
        }
        Err(e) => return Err(PipelineError::BufferProjection(format!("{:#}", e))),
    };

    Ok(BoundaryPolygon::wgs84(geometry))
}

/// Zone UTM du centroïde
fn metric_crs(geometry: &MultiPolygon<f64>) -> Result<Crs> {
    let centroid = geometry
        .centroid()
        .context("Cannot determine UTM zone: boundary has no centroid")?;
    utm_crs_for(centroid.x(), centroid.y())
}

fn buffer_in(geometry: &MultiPolygon<f64>, crs: Crs, distance: f64) -> Result<MultiPolygon<f64>> {
    debug!(crs = %crs, distance, "Buffering boundary");

    let projected = SmartReprojector::new(Crs::WGS84, crs)?
        .transform_geometry(geometry)
        .context(format!("Failed to project boundary to {}", crs))?;

    let grown = projected.buffer(distance);
    if grown.0.is_empty() {
        bail!("Buffer produced an empty geometry");
    }

    SmartReprojector::new(crs, Crs::WGS84)?
        .transform_geometry(&grown)
        .context(format!("Failed to reproject buffered boundary from {}", crs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area, Contains, Point};
    use osmnet::ErrorKind;

    fn square(x0: f64, y0: f64, side: f64) -> BoundaryPolygon {
        BoundaryPolygon::wgs84(MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
        ]]))
    }

    #[test]
    fn test_zero_distance_is_identity() {
        let boundary = square(-51.3, -30.2, 0.2);
        assert_eq!(apply_buffer(boundary.clone(), 0.0, false).unwrap(), boundary);
        assert_eq!(apply_buffer(boundary.clone(), -10.0, false).unwrap(), boundary);
    }

    #[test]
    fn test_buffer_grows_area() {
        let boundary = square(-51.3, -30.2, 0.2);
        let buffered = apply_buffer(boundary.clone(), 1000.0, false).unwrap();

        assert_eq!(buffered.crs, Crs::WGS84);
        assert!(buffered.geometry.unsigned_area() > boundary.geometry.unsigned_area());
        // ~1 km au-delà du bord ouest (0.01° ≈ 963 m à 30°S)
        assert!(buffered.geometry.contains(&Point::new(-51.308, -30.1)));
        assert!(!buffered.geometry.contains(&Point::new(-51.32, -30.1)));
    }

    #[test]
    fn test_larger_distance_larger_area() {
        let boundary = square(-47.9, -15.8, 0.1);
        let small = apply_buffer(boundary.clone(), 100.0, false).unwrap();
        let large = apply_buffer(boundary, 1000.0, false).unwrap();
        assert!(large.geometry.unsigned_area() > small.geometry.unsigned_area());
    }

    #[test]
    fn test_outside_utm_domain_fails() {
        let boundary = square(-60.0, -82.0, 0.5);
        let err = apply_buffer(boundary, 500.0, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferProjectionError);
    }

    #[test]
    fn test_mercator_fallback() {
        let boundary = square(-60.0, -82.0, 0.5);
        let buffered = apply_buffer(boundary.clone(), 500.0, true).unwrap();
        assert!(buffered.geometry.unsigned_area() > boundary.geometry.unsigned_area());
    }

    #[test]
    fn test_empty_boundary_fails() {
        let boundary = BoundaryPolygon::wgs84(MultiPolygon::new(vec![]));
        assert!(apply_buffer(boundary, 100.0, false).is_err());
    }
}
