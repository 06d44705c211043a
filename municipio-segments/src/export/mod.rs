//! Modules d'export (GeoPackage, reprojection PROJ)

pub mod gpkg;
#[cfg(feature = "reproject")]
pub mod reproject;
pub mod srs;

use serde::Serialize;

pub use gpkg::{normalize_archive_path, GpkgArchive};
#[cfg(feature = "reproject")]
pub use reproject::Reprojector;

/// Couche écrite avec succès dans l'archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveLayerRecord {
    pub archive_layer_id: String,
    pub display_name: String,
    pub row_count: usize,
}
