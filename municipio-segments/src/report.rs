//! Rapport de run avec graceful degradation
//!
//! Une entrée par code saisi, dans l'ordre de saisie : couche écrite ou
//! échec avec l'étape et la catégorie d'erreur.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use osmnet::{ErrorKind, NetworkType, PipelineError};

use crate::export::ArchiveLayerRecord;
use crate::pipeline::Stage;

/// Statut global du run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Toutes les municipalités ont été écrites
    Success,
    /// Au moins une couche écrite, au moins un échec
    PartialSuccess,
    /// Aucune couche écrite
    Failed,
}

/// Résultat pour un code
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AreaOutcome {
    Done {
        #[serde(flatten)]
        layer: ArchiveLayerRecord,
    },
    Failed {
        stage: Stage,
        kind: ErrorKind,
        message: String,
    },
}

/// Entrée du rapport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaReport {
    /// Code tel que saisi
    pub input: String,
    pub outcome: AreaOutcome,
}

/// Rapport complet du run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Archive GeoPackage (extension normalisée)
    pub archive_path: PathBuf,
    pub network_type: NetworkType,
    pub buffer_meters: f64,
    /// Durée du run
    pub duration_secs: f64,
    /// Statut global
    pub status: RunStatus,
    pub areas: Vec<AreaReport>,
}

impl RunSummary {
    pub fn new(archive_path: &Path, network_type: NetworkType, buffer_meters: f64) -> Self {
        Self {
            archive_path: archive_path.to_path_buf(),
            network_type,
            buffer_meters,
            duration_secs: 0.0,
            status: RunStatus::Success,
            areas: Vec::new(),
        }
    }

    /// Enregistre une couche écrite
    pub fn record_success(&mut self, input: &str, layer: ArchiveLayerRecord) {
        self.areas.push(AreaReport {
            input: input.to_string(),
            outcome: AreaOutcome::Done { layer },
        });
    }

    /// Enregistre un échec
    pub fn record_failure(&mut self, input: &str, stage: Stage, error: &PipelineError) {
        self.areas.push(AreaReport {
            input: input.to_string(),
            outcome: AreaOutcome::Failed {
                stage,
                kind: error.kind(),
                message: error.to_string(),
            },
        });
    }

    /// Définit la durée du run
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Couches écrites, dans l'ordre de saisie
    pub fn layers(&self) -> impl Iterator<Item = &ArchiveLayerRecord> {
        self.areas.iter().filter_map(|a| match &a.outcome {
            AreaOutcome::Done { layer } => Some(layer),
            AreaOutcome::Failed { .. } => None,
        })
    }

    pub fn succeeded(&self) -> usize {
        self.layers().count()
    }

    pub fn failed(&self) -> usize {
        self.areas.len() - self.succeeded()
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        let has_errors = self.failed() > 0;
        let has_success = self.succeeded() > 0;

        self.status = if has_errors && has_success {
            RunStatus::PartialSuccess
        } else if has_errors {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("RUN REPORT - {}", self.archive_path.display());
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!(
            "Network: {}, buffer: {} m",
            self.network_type, self.buffer_meters
        );

        println!("\n--- SUMMARY ---");
        println!(
            "Codes: {} processed, {} written, {} failed",
            self.areas.len(),
            self.succeeded(),
            self.failed()
        );

        let layers: Vec<_> = self.layers().collect();
        if !layers.is_empty() {
            println!("\n--- LAYERS ({}) ---", layers.len());
            for layer in layers {
                println!(
                    "  {} ({}): {} segments",
                    layer.archive_layer_id, layer.display_name, layer.row_count
                );
            }
        }

        if self.failed() > 0 {
            println!("\n--- ERRORS ({}) ---", self.failed());
            for area in &self.areas {
                if let AreaOutcome::Failed {
                    stage,
                    kind,
                    message,
                } = &area.outcome
                {
                    println!("  [{}] {} at {}: {}", area.input, kind, stage, message);
                }
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} layers written, {} failed",
            self.archive_path.display(),
            self.succeeded(),
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, rows: usize) -> ArchiveLayerRecord {
        ArchiveLayerRecord {
            archive_layer_id: format!("osm_segments_{}", code),
            display_name: format!("OSMnx_Test_RS_drive_segments_{}", code),
            row_count: rows,
        }
    }

    fn summary() -> RunSummary {
        RunSummary::new(Path::new("out.gpkg"), NetworkType::Drive, 0.0)
    }

    #[test]
    fn test_finalize_success() {
        let mut report = summary();
        report.record_success("4314902", record("4314902", 10));
        report.finalize();

        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn test_finalize_partial_success() {
        let mut report = summary();
        report.record_success("4314902", record("4314902", 10));
        report.record_failure(
            "123",
            Stage::Validating,
            &PipelineError::invalid_code("123", "expected 6 or 7 digits, got 3"),
        );
        report.finalize();

        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.layers().count(), 1);
    }

    #[test]
    fn test_finalize_failed() {
        let mut report = summary();
        report.record_failure(
            "4314902",
            Stage::NetworkFetch,
            &PipelineError::network_failed("drive", "HTTP 504"),
        );
        report.finalize();

        assert_eq!(report.status, RunStatus::Failed);
    }

    #[test]
    fn test_order_is_input_order() {
        let mut report = summary();
        report.record_failure("abc", Stage::Validating, &PipelineError::invalid_code("abc", "digits"));
        report.record_success("4314902", record("4314902", 1));
        report.record_success("4305108", record("4305108", 2));

        let inputs: Vec<_> = report.areas.iter().map(|a| a.input.as_str()).collect();
        assert_eq!(inputs, vec!["abc", "4314902", "4305108"]);
    }

    #[test]
    fn test_json_shape() {
        let mut report = summary();
        report.record_success("4314902", record("4314902", 10));
        report.record_failure(
            "123",
            Stage::Validating,
            &PipelineError::invalid_code("123", "expected 6 or 7 digits, got 3"),
        );
        report.finalize();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "PartialSuccess");
        assert_eq!(json["network_type"], "drive");
        assert_eq!(json["areas"][0]["outcome"]["status"], "done");
        assert_eq!(json["areas"][0]["outcome"]["archive_layer_id"], "osm_segments_4314902");
        assert_eq!(json["areas"][1]["outcome"]["kind"], "InvalidCodeFormat");
        assert_eq!(json["areas"][1]["outcome"]["stage"], "Validating");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut report = summary();
        report.record_success("4314902", record("4314902", 10));
        report.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("osm_segments_4314902"));
    }

    #[test]
    fn test_summary() {
        let mut report = summary();
        report.record_success("4314902", record("4314902", 10));
        assert!(report.summary().contains("1 layers written"));
    }
}
