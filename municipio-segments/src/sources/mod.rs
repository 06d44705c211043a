//! Collaborateurs externes du pipeline
//!
//! Chaque service est derrière un trait afin que les tests puissent fournir
//! des implémentations déterministes. Les implémentations HTTP (IBGE,
//! Nominatim, Overpass) partagent un client `reqwest` construit depuis les
//! [`Settings`](crate::config::Settings).

pub mod ibge;
pub mod nominatim;
pub mod overpass;

use anyhow::{Context, Result};
use async_trait::async_trait;
use geo::MultiPolygon;
use reqwest::Client;

use osmnet::{AdministrativeCode, AreaIdentity, BoundaryPolygon, NetworkGraph, NetworkType};
use osmnet::PipelineError;

use crate::config::Settings;

pub use ibge::IbgeLookup;
pub use nominatim::NominatimGeocoder;
pub use overpass::OverpassProvider;

/// Résolution d'un code en nom de municipalité et UF
#[async_trait]
pub trait AreaLookup: Send + Sync {
    /// Un seul appel par code, sans nouvelle tentative
    async fn lookup(&self, code: &AdministrativeCode) -> Result<AreaIdentity, PipelineError>;
}

/// Géocodage d'une requête texte en polygone WGS84
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` quand le service ne connaît aucune géométrie surfacique
    async fn geocode(&self, query: &str) -> Result<Option<MultiPolygon<f64>>, PipelineError>;
}

/// Téléchargement du graphe routier d'une zone
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Graphe en WGS84, découpé par `boundary`; il peut être vide
    async fn fetch_graph(
        &self,
        boundary: &BoundaryPolygon,
        network_type: NetworkType,
    ) -> Result<NetworkGraph, PipelineError>;
}

/// Client HTTP partagé par les collaborateurs
pub fn http_client(settings: &Settings) -> Result<Client> {
    Client::builder()
        .user_agent(&settings.user_agent)
        .connect_timeout(settings.timeout())
        .timeout(settings.timeout())
        .build()
        .context("Failed to build HTTP client")
}

/// Message lisible pour une erreur `reqwest`
pub(crate) fn describe_http_error(error: &reqwest::Error, timeout_secs: u64) -> String {
    if error.is_timeout() {
        return format!("request timed out after {}s", timeout_secs);
    }
    if let Some(status) = error.status() {
        return format!("HTTP {}", status.as_u16());
    }
    error.to_string()
}
