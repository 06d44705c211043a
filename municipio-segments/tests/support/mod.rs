//! Collaborateurs déterministes pour les tests du pipeline

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use geo::{polygon, Area, BoundingRect, MultiPolygon};

use municipio_segments::feedback::Feedback;
use municipio_segments::pipeline::{Collaborators, Pipeline, PipelineOptions};
use municipio_segments::registry::LayerRegistry;
use municipio_segments::sources::{AreaLookup, Geocoder, NetworkProvider};
use osmnet::osm::OsmElement;
use osmnet::{
    AdministrativeCode, AreaIdentity, BoundaryPolygon, GraphBuilder, NetworkGraph, NetworkType,
    OsmResponse, PipelineError,
};

/// Carré de `side` degrés dont le coin sud-ouest est `(x0, y0)`
pub fn square(x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x0, y: y0),
        (x: x0 + side, y: y0),
        (x: x0 + side, y: y0 + side),
        (x: x0, y: y0 + side),
    ]])
}

/// Municipalités connues : code, nom, UF, limite
pub fn municipalities() -> Vec<(&'static str, &'static str, &'static str, MultiPolygon<f64>)> {
    vec![
        ("4314902", "Porto Alegre", "RS", square(-51.30, -30.20, 0.10)),
        ("4305108", "Caxias do Sul", "RS", square(-51.25, -29.22, 0.10)),
        ("5300108", "Brasília", "DF", square(-47.95, -15.85, 0.10)),
    ]
}

pub struct FakeLookup {
    areas: HashMap<String, (String, String)>,
}

impl FakeLookup {
    pub fn new() -> Self {
        let areas = municipalities()
            .into_iter()
            .map(|(code, name, uf, _)| (code.to_string(), (name.to_string(), uf.to_string())))
            .collect();
        Self { areas }
    }
}

#[async_trait]
impl AreaLookup for FakeLookup {
    async fn lookup(&self, code: &AdministrativeCode) -> Result<AreaIdentity, PipelineError> {
        let (name, uf) = self
            .areas
            .get(code.as_str())
            .ok_or_else(|| PipelineError::lookup_failed(code.as_str(), "HTTP 404"))?;
        Ok(AreaIdentity {
            code: code.clone(),
            name: name.clone(),
            uf: uf.clone(),
        })
    }
}

pub struct FakeGeocoder {
    boundaries: HashMap<String, Option<MultiPolygon<f64>>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        let boundaries = municipalities()
            .into_iter()
            .map(|(_, name, uf, boundary)| (format!("{}, {}, Brasil", name, uf), Some(boundary)))
            .collect();
        Self { boundaries }
    }

    /// Le géocodeur ne connaît aucune géométrie pour `query`
    pub fn without(mut self, query: &str) -> Self {
        self.boundaries.insert(query.to_string(), None);
        self
    }

    /// Remplace la limite retournée pour `query`
    pub fn with_boundary(mut self, query: &str, boundary: MultiPolygon<f64>) -> Self {
        self.boundaries.insert(query.to_string(), Some(boundary));
        self
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<MultiPolygon<f64>>, PipelineError> {
        Ok(self.boundaries.get(query).cloned().flatten())
    }
}

/// Appel reçu par le fournisseur de réseau
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub boundary_area: f64,
    pub network_type: NetworkType,
    pub edge_count: usize,
}

/// Grille de rues 4x4 couvrant l'emprise de la limite reçue
#[derive(Clone, Default)]
pub struct GridNetwork {
    pub calls: Arc<Mutex<Vec<FetchCall>>>,
    /// Réponses vides pour les limites dont l'emprise contient ce point
    pub empty_near: Option<(f64, f64)>,
}

impl GridNetwork {
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn grid(boundary: &MultiPolygon<f64>) -> OsmResponse {
        let Some(rect) = boundary.bounding_rect() else {
            return OsmResponse::default();
        };
        let fractions = [0.2, 0.4, 0.6, 0.8];
        let mut elements = Vec::new();

        for (row, fy) in fractions.iter().enumerate() {
            for (col, fx) in fractions.iter().enumerate() {
                elements.push(OsmElement::Node {
                    id: (row * 4 + col + 1) as i64,
                    lat: rect.min().y + fy * rect.height(),
                    lon: rect.min().x + fx * rect.width(),
                    tags: HashMap::new(),
                });
            }
        }

        let highway = |name: String| -> HashMap<String, String> {
            [("highway", "residential".to_string()), ("name", name)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect()
        };
        for i in 0..4i64 {
            elements.push(OsmElement::Way {
                id: 100 + i,
                nodes: (0..4).map(|c| i * 4 + c + 1).collect(),
                tags: highway(format!("Rua {}", i)),
            });
            elements.push(OsmElement::Way {
                id: 200 + i,
                nodes: (0..4).map(|r| r * 4 + i + 1).collect(),
                tags: highway(format!("Avenida {}", i)),
            });
        }

        OsmResponse {
            elements,
            remark: None,
        }
    }
}

#[async_trait]
impl NetworkProvider for GridNetwork {
    async fn fetch_graph(
        &self,
        boundary: &BoundaryPolygon,
        network_type: NetworkType,
    ) -> Result<NetworkGraph, PipelineError> {
        let empty = self.empty_near.is_some_and(|(x, y)| {
            boundary
                .geometry
                .bounding_rect()
                .is_some_and(|r| r.min().x <= x && x <= r.max().x && r.min().y <= y && y <= r.max().y)
        });
        let response = if empty {
            OsmResponse::default()
        } else {
            Self::grid(&boundary.geometry)
        };
        let graph = GraphBuilder::new(network_type).build(&response, &boundary.geometry);

        self.calls.lock().unwrap().push(FetchCall {
            boundary_area: boundary.geometry.unsigned_area(),
            network_type,
            edge_count: graph.edge_count(),
        });
        Ok(graph)
    }
}

#[derive(Clone, Default)]
pub struct RecordingRegistry {
    pub entries: Arc<Mutex<Vec<(PathBuf, String, String)>>>,
    /// Refuse tout enregistrement
    pub failing: bool,
}

impl RecordingRegistry {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<(PathBuf, String, String)> {
        self.entries.lock().unwrap().clone()
    }
}

impl LayerRegistry for RecordingRegistry {
    fn register(&self, archive_path: &Path, layer_id: &str, display_name: &str) -> Result<()> {
        if self.failing {
            bail!("layer manifest is read-only");
        }
        self.entries.lock().unwrap().push((
            archive_path.to_path_buf(),
            layer_id.to_string(),
            display_name.to_string(),
        ));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingFeedback {
    pub infos: Arc<Mutex<Vec<String>>>,
    pub errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingFeedback {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Feedback for RecordingFeedback {
    fn push_info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn report_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Pipeline câblé sur les faux collaborateurs
pub struct Harness {
    pub pipeline: Pipeline,
    pub network: GridNetwork,
    pub registry: RecordingRegistry,
    pub feedback: RecordingFeedback,
}

impl Harness {
    pub fn new(options: PipelineOptions) -> Self {
        Self::with(FakeGeocoder::new(), GridNetwork::default(), options)
    }

    pub fn with(geocoder: FakeGeocoder, network: GridNetwork, options: PipelineOptions) -> Self {
        Self::with_registry(geocoder, network, RecordingRegistry::default(), options)
    }

    pub fn with_registry(
        geocoder: FakeGeocoder,
        network: GridNetwork,
        registry: RecordingRegistry,
        options: PipelineOptions,
    ) -> Self {
        let feedback = RecordingFeedback::default();
        let collaborators = Collaborators {
            lookup: Box::new(FakeLookup::new()),
            geocoder: Box::new(geocoder),
            network: Box::new(network.clone()),
            registry: Box::new(registry.clone()),
            feedback: Box::new(feedback.clone()),
        };
        Self {
            pipeline: Pipeline::new(collaborators, options),
            network,
            registry,
            feedback,
        }
    }
}
