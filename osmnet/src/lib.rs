//! # osmnet
//!
//! Modèle de réseau routier OpenStreetMap pour les municipalités brésiliennes.
//!
//! ## Features
//!
//! - Validation des codes de municipalité IBGE (6 ou 7 chiffres)
//! - Profils de réseau (drive, walk, bike, all, drive_service) avec les filtres OSMnx
//! - Construction du graphe depuis une réponse Overpass : composante principale,
//!   simplification topologique, découpage par polygone
//! - Conversion du graphe en table de segments et nommage des couches
//!
//! ## Usage
//!
//! ```rust,ignore
//! use osmnet::{extract_segments, parse_batch, AdministrativeCode, GraphBuilder, NetworkType};
//!
//! for raw in parse_batch("4314902;4305108") {
//!     let code = AdministrativeCode::parse(&raw)?;
//!     println!("{}", osmnet::naming::archive_layer_id(code.as_str()));
//! }
//!
//! let graph = GraphBuilder::new(NetworkType::Drive).build(&response, &boundary);
//! let table = extract_segments(graph);
//! println!("{} segments", table.len());
//! ```

pub mod code;
pub mod error;
pub mod graph;
pub mod naming;
pub mod osm;
pub mod profile;
pub mod segments;
pub mod types;

pub use code::{parse_batch, AdministrativeCode};
pub use error::{ErrorKind, PipelineError};
pub use graph::{Edge, EdgeAttributes, GraphBuilder, NetworkGraph, Node};
pub use naming::{derive_names, LayerNames};
pub use osm::OsmResponse;
pub use profile::NetworkType;
pub use segments::{extract_segments, strip_crs, Segment, SegmentTable};
pub use types::{AreaIdentity, BoundaryPolygon, Crs};
