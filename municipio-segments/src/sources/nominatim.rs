//! Géocodage des limites municipales avec Nominatim

use async_trait::async_trait;
use geo::{Geometry, MultiPolygon};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use osmnet::PipelineError;

use super::{describe_http_error, Geocoder};
use crate::config::Settings;

/// Nombre de résultats demandés ; le premier surfacique est retenu
const RESULT_LIMIT: &str = "50";

/// Un résultat de `/search`
#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    geojson: Option<geojson::Geometry>,
}

/// Géocodeur HTTP Nominatim
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl NominatimGeocoder {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.nominatim_url.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<MultiPolygon<f64>>, PipelineError> {
        debug!(query, "Geocoding boundary");

        let failed = |reason: String| PipelineError::boundary_not_found(query, reason);

        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("q", query),
                ("format", "json"),
                ("polygon_geojson", "1"),
                ("limit", RESULT_LIMIT),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(describe_http_error(&e, self.timeout_secs)))?;

        let body = response
            .text()
            .await
            .map_err(|e| failed(describe_http_error(&e, self.timeout_secs)))?;

        parse_search_results(&body).map_err(failed)
    }
}

/// Premier polygone (ou multipolygone) d'une réponse `/search`
pub fn parse_search_results(body: &str) -> Result<Option<MultiPolygon<f64>>, String> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|e| format!("invalid JSON response: {}", e))?;

    for place in places {
        let Some(geometry) = place.geojson else {
            continue;
        };
        // Les points et lignes (ex: nœud "place=city") sont ignorés
        match Geometry::<f64>::try_from(geometry) {
            Ok(Geometry::Polygon(polygon)) => return Ok(Some(MultiPolygon::new(vec![polygon]))),
            Ok(Geometry::MultiPolygon(multi)) => return Ok(Some(multi)),
            Ok(_) => continue,
            Err(e) => return Err(format!("invalid GeoJSON geometry: {}", e)),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    const POLYGON_RESULT: &str = r#"[
        {
            "place_id": 1,
            "display_name": "Porto Alegre, Rio Grande do Sul, Brasil",
            "geojson": {"type": "Point", "coordinates": [-51.23, -30.03]}
        },
        {
            "place_id": 2,
            "display_name": "Porto Alegre, Região Geográfica Imediata de Porto Alegre, Brasil",
            "geojson": {
                "type": "Polygon",
                "coordinates": [[[-51.3, -30.3], [-51.0, -30.3], [-51.0, -29.9], [-51.3, -29.9], [-51.3, -30.3]]]
            }
        }
    ]"#;

    #[test]
    fn test_first_polygon_is_selected() {
        let multi = parse_search_results(POLYGON_RESULT).unwrap().unwrap();
        assert_eq!(multi.0.len(), 1);
        assert!(multi.unsigned_area() > 0.0);
    }

    #[test]
    fn test_multipolygon() {
        let body = r#"[{"geojson": {
            "type": "MultiPolygon",
            "coordinates": [
                [[[-51.3, -30.3], [-51.2, -30.3], [-51.2, -30.2], [-51.3, -30.3]]],
                [[[-51.1, -30.1], [-51.0, -30.1], [-51.0, -30.0], [-51.1, -30.1]]]
            ]
        }}]"#;
        let multi = parse_search_results(body).unwrap().unwrap();
        assert_eq!(multi.0.len(), 2);
    }

    #[test]
    fn test_no_surface_geometry() {
        assert_eq!(parse_search_results("[]").unwrap(), None);

        let points_only = r#"[{"geojson": {"type": "Point", "coordinates": [-51.23, -30.03]}}, {"place_id": 3}]"#;
        assert_eq!(parse_search_results(points_only).unwrap(), None);
    }

    #[test]
    fn test_invalid_body() {
        assert!(parse_search_results("<html>rate limited</html>").is_err());
    }
}
