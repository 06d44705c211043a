//! Orchestration du pipeline par municipalité
//!
//! Les codes sont traités un par un. Une erreur d'un code est consignée dans
//! le [`RunSummary`] avec son étape, puis le code suivant est traité. Seules
//! les erreurs indépendantes des codes (aucun code, archive inutilisable)
//! interrompent le run.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use osmnet::code::dedupe;
use osmnet::{
    derive_names, extract_segments, parse_batch, strip_crs, AdministrativeCode, BoundaryPolygon,
    NetworkType, PipelineError,
};

use crate::buffer::apply_buffer;
use crate::config::Settings;
use crate::export::{normalize_archive_path, ArchiveLayerRecord, GpkgArchive};
use crate::feedback::Feedback;
use crate::project::project_graph;
use crate::registry::LayerRegistry;
use crate::report::RunSummary;
use crate::sources::{AreaLookup, Geocoder, NetworkProvider};

/// Étapes du traitement d'un code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Pending,
    Validating,
    Resolving,
    BoundaryFetch,
    Buffering,
    NetworkFetch,
    Projecting,
    Extracting,
    Sanitizing,
    Writing,
    Registering,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Erreur d'un code, avec l'étape où elle est survenue
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub error: PipelineError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T, PipelineError> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|error| StageError { stage, error })
    }
}

/// Paramètres d'un run, tels que saisis par l'hôte
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Un ou plusieurs codes, séparés par virgule, point-virgule ou blancs
    pub codes: String,
    pub network_type: NetworkType,
    /// Distance de buffer en mètres (0 = aucun)
    pub buffer_meters: f64,
    /// Chemin de l'archive ; l'extension est forcée à `.gpkg`
    pub output: PathBuf,
}

/// Options du pipeline issues des [`Settings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub strip_crs: bool,
    pub dedupe_codes: bool,
    pub buffer_mercator_fallback: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            strip_crs: settings.strip_crs,
            dedupe_codes: settings.dedupe_codes,
            buffer_mercator_fallback: settings.buffer_mercator_fallback,
        }
    }
}

/// Collaborateurs externes du pipeline
pub struct Collaborators {
    pub lookup: Box<dyn AreaLookup>,
    pub geocoder: Box<dyn Geocoder>,
    pub network: Box<dyn NetworkProvider>,
    pub registry: Box<dyn LayerRegistry>,
    pub feedback: Box<dyn Feedback>,
}

/// Orchestrateur séquentiel ; seul écrivain de l'archive
pub struct Pipeline {
    collaborators: Collaborators,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, options: PipelineOptions) -> Self {
        Self {
            collaborators,
            options,
        }
    }

    /// Traite tous les codes de la requête
    ///
    /// # Errors
    ///
    /// Erreurs fatales uniquement : aucun code saisi, répertoire de sortie
    /// absent ou archive impossible à initialiser.
    pub async fn run(&self, request: &RunRequest) -> Result<RunSummary> {
        let started = Instant::now();
        let feedback = self.collaborators.feedback.as_ref();

        let mut codes = parse_batch(&request.codes);
        if self.options.dedupe_codes {
            codes = dedupe(codes);
        }
        if codes.is_empty() {
            bail!("No administrative code provided");
        }
        feedback.push_info(&format!("Administrative codes: {}", codes.join(", ")));

        let archive_path = normalize_archive_path(&request.output);
        let archive = GpkgArchive::new(&archive_path, self.options.strip_crs);
        archive
            .initialize()
            .context(format!("Cannot initialise archive {}", archive_path.display()))?;
        feedback.push_info(&format!("Output GeoPackage: {}", archive_path.display()));

        let mut summary =
            RunSummary::new(&archive_path, request.network_type, request.buffer_meters);

        for raw in &codes {
            match self.process_area(raw, request, &archive).await {
                Ok(record) => {
                    feedback.push_info(&format!(
                        "Layer '{}' written ({} segments)",
                        record.display_name, record.row_count
                    ));
                    summary.record_success(raw, record);
                }
                Err(StageError { stage, error }) => {
                    warn!(code = %raw, stage = %stage, kind = %error.kind(), "Area failed: {}", error);
                    feedback.report_error(&format!("[{}] {} at {}: {}", raw, error.kind(), stage, error));
                    summary.record_failure(raw, stage, &error);
                }
            }
        }

        summary.set_duration(started.elapsed());
        summary.finalize();
        info!(
            status = ?summary.status,
            written = summary.succeeded(),
            failed = summary.failed(),
            "Run finished"
        );
        Ok(summary)
    }

    /// Pipeline complet d'un code, de la validation à l'enregistrement
    async fn process_area(
        &self,
        raw: &str,
        request: &RunRequest,
        archive: &GpkgArchive,
    ) -> Result<ArchiveLayerRecord, StageError> {
        let c = &self.collaborators;
        let network_type = request.network_type;

        enter(raw, Stage::Validating);
        let code = AdministrativeCode::parse(raw).at(Stage::Validating)?;

        enter(raw, Stage::Resolving);
        let identity = c.lookup.lookup(&code).await.at(Stage::Resolving)?;
        c.feedback
            .push_info(&format!("Municipality: {} - {} ({})", identity.name, identity.uf, code));

        enter(raw, Stage::BoundaryFetch);
        let query = identity.place_query();
        let boundary = c
            .geocoder
            .geocode(&query)
            .await
            .and_then(|geometry| match geometry.map(BoundaryPolygon::wgs84) {
                Some(boundary) if !boundary.is_empty() => Ok(boundary),
                Some(_) => Err(PipelineError::boundary_not_found(&query, "empty geometry")),
                None => Err(PipelineError::boundary_not_found(&query, "no polygon returned")),
            })
            .at(Stage::BoundaryFetch)?;

        let boundary = if request.buffer_meters > 0.0 {
            enter(raw, Stage::Buffering);
            c.feedback.push_info(&format!(
                "Applying {} m buffer around the municipal boundary",
                request.buffer_meters
            ));
            apply_buffer(
                boundary,
                request.buffer_meters,
                self.options.buffer_mercator_fallback,
            )
            .at(Stage::Buffering)?
        } else {
            boundary
        };

        enter(raw, Stage::NetworkFetch);
        c.feedback.push_info(&format!(
            "Downloading '{}' network for {}",
            network_type, query
        ));
        let graph = c
            .network
            .fetch_graph(&boundary, network_type)
            .await
            .and_then(|graph| {
                if graph.is_empty() {
                    Err(PipelineError::network_failed(
                        format!("{} network of {}", network_type, query),
                        "network graph has no edges",
                    ))
                } else {
                    Ok(graph)
                }
            })
            .at(Stage::NetworkFetch)?;
        drop(boundary);

        enter(raw, Stage::Projecting);
        let projected = project_graph(graph).at(Stage::Projecting)?;
        let crs = projected.crs;

        enter(raw, Stage::Extracting);
        let mut table = extract_segments(projected);

        enter(raw, Stage::Sanitizing);
        if archive.strips_crs() {
            c.feedback.push_info(&format!(
                "Removing CRS ({}) before writing; assign it manually after loading",
                crs
            ));
            table = strip_crs(table);
        }

        enter(raw, Stage::Writing);
        let names = derive_names(&identity, network_type.as_str(), request.buffer_meters);
        let record = archive
            .write_layer(&names.archive_layer_id, &names.display_name, &table)
            .at(Stage::Writing)?;
        drop(table);

        enter(raw, Stage::Registering);
        // La couche est écrite : un échec d'enregistrement n'est qu'un avertissement
        if let Err(e) = c
            .registry
            .register(archive.path(), &record.archive_layer_id, &record.display_name)
        {
            c.feedback.report_error(&format!(
                "Layer '{}' was written but could not be registered: {:#}",
                record.archive_layer_id, e
            ));
        }

        enter(raw, Stage::Done);
        Ok(record)
    }
}

fn enter(code: &str, stage: Stage) {
    debug!(code, stage = %stage, "Entering stage");
}
