//! # municipio-segments
//!
//! Téléchargement des segments de rue OpenStreetMap de municipalités
//! brésiliennes (codes IBGE) vers un GeoPackage multi-couches.
//!
//! ## Features
//!
//! - Lookup IBGE, géocodage Nominatim et réseau Overpass derrière des traits
//! - Buffer métrique via la zone UTM locale
//! - Projection du graphe en UTM, reprojection pure Rust (PROJ en option)
//! - Une couche `osm_segments_<code>` par municipalité, réécrite sans toucher
//!   aux autres couches
//! - Rapport de run (console et JSON)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Deux municipalités, réseau complet, buffer de 1 km
//! municipio-segments --codes "4314902,4305108" --network-type all \
//!     --buffer-meters 1000 --output ./segments.gpkg
//!
//! # Conserver le Crs UTM et sauvegarder le rapport
//! municipio-segments --codes 4314902 --output out.gpkg --keep-crs --report run.json
//! ```

pub mod buffer;
pub mod config;
pub mod export;
pub mod feedback;
pub mod pipeline;
pub mod project;
pub mod registry;
pub mod report;
pub mod reproject_lite;
pub mod sources;

pub use config::Settings;
pub use export::{ArchiveLayerRecord, GpkgArchive};
pub use pipeline::{Collaborators, Pipeline, PipelineOptions, RunRequest, Stage};
pub use report::{AreaOutcome, RunStatus, RunSummary};
