//! Téléchargement du réseau routier avec l'API Overpass
//!
//! Une requête par zone : une instruction `way` par polygone (anneau
//! extérieur), suivie de la récursion `>` pour obtenir les nœuds.

use async_trait::async_trait;
use geo::{MultiPolygon, Polygon};
use reqwest::Client;
use tracing::{debug, info};

use osmnet::{BoundaryPolygon, GraphBuilder, NetworkGraph, NetworkType, OsmResponse, PipelineError};

use super::{describe_http_error, NetworkProvider};
use crate::config::Settings;

/// Fournisseur de graphe via Overpass
#[derive(Debug, Clone)]
pub struct OverpassProvider {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
    server_timeout_secs: u64,
}

impl OverpassProvider {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            endpoint: settings.overpass_url.clone(),
            timeout_secs: settings.timeout_secs,
            server_timeout_secs: settings.overpass_timeout_secs,
        }
    }

    /// Requête Overpass QL pour un profil et une zone
    pub fn build_query(&self, area: &MultiPolygon<f64>, network_type: NetworkType) -> String {
        let filter = network_type.overpass_filter();
        let ways: String = area
            .iter()
            .map(|polygon| format!("way{}(poly:\"{}\");", filter, poly_string(polygon)))
            .collect();

        format!(
            "[out:json][timeout:{}];({}>;);out;",
            self.server_timeout_secs, ways
        )
    }
}

/// Anneau extérieur au format `"lat lon lat lon ..."`
fn poly_string(polygon: &Polygon<f64>) -> String {
    polygon
        .exterior()
        .coords()
        .map(|c| format!("{:.6} {:.6}", c.y, c.x))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Une remarque `runtime error` signale une réponse tronquée
fn check_remark(response: &OsmResponse) -> Result<(), String> {
    match &response.remark {
        Some(remark) if remark.contains("runtime error") => Err(remark.clone()),
        _ => Ok(()),
    }
}

#[async_trait]
impl NetworkProvider for OverpassProvider {
    async fn fetch_graph(
        &self,
        boundary: &BoundaryPolygon,
        network_type: NetworkType,
    ) -> Result<NetworkGraph, PipelineError> {
        let query = self.build_query(&boundary.geometry, network_type);
        debug!(endpoint = %self.endpoint, bytes = query.len(), "Posting Overpass query");

        let failed = |reason: String| PipelineError::network_failed(network_type.as_str(), reason);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(describe_http_error(&e, self.timeout_secs)))?;

        let osm: OsmResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid Overpass response: {}", e)))?;
        check_remark(&osm).map_err(failed)?;

        info!(
            network_type = %network_type,
            elements = osm.elements.len(),
            ways = osm.way_count(),
            "Overpass response received"
        );

        Ok(GraphBuilder::new(network_type).build(&osm, &boundary.geometry))
    }
}
