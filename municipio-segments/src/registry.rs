//! Enregistrement des couches auprès de l'hôte
//!
//! Le pipeline transmet `(archive, identifiant, nom d'affichage)` après chaque
//! écriture réussie. [`ManifestRegistry`] les consigne dans un fichier JSON à
//! côté de l'archive, que l'hôte charge ensuite.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Collaborateur d'enregistrement des couches
pub trait LayerRegistry: Send + Sync {
    fn register(&self, archive_path: &Path, layer_id: &str, display_name: &str) -> Result<()>;
}

/// N'enregistre rien
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistry;

impl LayerRegistry for NoopRegistry {
    fn register(&self, _archive_path: &Path, _layer_id: &str, _display_name: &str) -> Result<()> {
        Ok(())
    }
}

/// Entrée du manifeste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEntry {
    /// Source OGR : `chemin|layername=identifiant`
    pub uri: String,
    pub layer_id: String,
    pub display_name: String,
}

/// Manifeste JSON `<archive>.layers.json`
#[derive(Debug, Clone, Default)]
pub struct ManifestRegistry;

impl ManifestRegistry {
    /// Chemin du manifeste associé à une archive
    pub fn manifest_path(archive_path: &Path) -> PathBuf {
        let mut name = archive_path.as_os_str().to_os_string();
        name.push(".layers.json");
        PathBuf::from(name)
    }

    /// Entrées actuelles du manifeste (vide s'il n'existe pas)
    pub fn load(archive_path: &Path) -> Result<Vec<LayerEntry>> {
        let path = Self::manifest_path(archive_path);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .context(format!("Failed to read layer manifest: {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse layer manifest")
    }
}

impl LayerRegistry for ManifestRegistry {
    fn register(&self, archive_path: &Path, layer_id: &str, display_name: &str) -> Result<()> {
        let mut entries = Self::load(archive_path)?;
        let entry = LayerEntry {
            uri: format!("{}|layername={}", archive_path.display(), layer_id),
            layer_id: layer_id.to_string(),
            display_name: display_name.to_string(),
        };

        // Une couche réécrite remplace son entrée
        match entries.iter_mut().find(|e| e.layer_id == layer_id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }

        let path = Self::manifest_path(archive_path);
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&path, json)
            .context(format!("Failed to write layer manifest: {}", path.display()))?;

        debug!(manifest = %path.display(), layer = layer_id, "Layer registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_path() {
        assert_eq!(
            ManifestRegistry::manifest_path(Path::new("/tmp/out.gpkg")),
            PathBuf::from("/tmp/out.gpkg.layers.json")
        );
    }

    #[test]
    fn test_register_appends_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("out.gpkg");
        let registry = ManifestRegistry;

        registry
            .register(&archive, "osm_segments_4314902", "OSMnx_Porto_Alegre_RS_drive_segments")
            .unwrap();
        registry
            .register(&archive, "osm_segments_4305108", "OSMnx_Caxias_do_Sul_RS_drive_segments")
            .unwrap();
        registry
            .register(&archive, "osm_segments_4314902", "OSMnx_Porto_Alegre_RS_walk_segments")
            .unwrap();

        let entries = ManifestRegistry::load(&archive).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name, "OSMnx_Porto_Alegre_RS_walk_segments");
        assert_eq!(
            entries[0].uri,
            format!("{}|layername=osm_segments_4314902", archive.display())
        );
        assert_eq!(entries[1].layer_id, "osm_segments_4305108");
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ManifestRegistry::load(&dir.path().join("none.gpkg")).unwrap().is_empty());
    }
}
