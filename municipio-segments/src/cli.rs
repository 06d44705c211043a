//! Définition et implémentation de la commande CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use municipio_segments::config::Settings;
use municipio_segments::feedback::TracingFeedback;
use municipio_segments::pipeline::{Collaborators, Pipeline, PipelineOptions, RunRequest};
use municipio_segments::registry::{LayerRegistry, ManifestRegistry, NoopRegistry};
use municipio_segments::report::RunSummary;
use municipio_segments::sources::{http_client, IbgeLookup, NominatimGeocoder, OverpassProvider};
use osmnet::NetworkType;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// IBGE municipality codes, separated by commas, semicolons or spaces
    #[arg(short, long)]
    pub codes: String,

    /// Network type: drive, all, walk, bike, drive_service
    #[arg(short, long, default_value = "drive", value_parser = parse_network_type)]
    pub network_type: NetworkType,

    /// Buffer around the municipal boundary, in meters (0 = none)
    #[arg(short, long, default_value_t = 0.0)]
    pub buffer_meters: f64,

    /// Output GeoPackage (the extension is forced to .gpkg)
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON settings file (service URLs, timeouts, options)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save the run report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Keep the UTM CRS on written layers (default: strip it)
    #[arg(long)]
    pub keep_crs: bool,

    /// Process each repeated code only once
    #[arg(long)]
    pub dedupe: bool,

    /// Do not write the <archive>.layers.json manifest
    #[arg(long)]
    pub no_manifest: bool,
}

fn parse_network_type(s: &str) -> Result<NetworkType, String> {
    s.parse()
}

/// Settings : défauts, fichier, environnement puis options CLI
pub fn load_settings(args: &RunArgs) -> Result<Settings> {
    let base = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut settings = base.with_env();
    if args.keep_crs {
        settings.strip_crs = false;
    }
    if args.dedupe {
        settings.dedupe_codes = true;
    }
    Ok(settings)
}

/// Exécute un run complet avec les collaborateurs HTTP
pub async fn cmd_run(args: &RunArgs) -> Result<RunSummary> {
    let settings = load_settings(args)?;
    info!(
        ibge = %settings.ibge_url,
        nominatim = %settings.nominatim_url,
        overpass = %settings.overpass_url,
        strip_crs = settings.strip_crs,
        "Settings loaded"
    );

    let registry: Box<dyn LayerRegistry> = if args.no_manifest {
        Box::new(NoopRegistry)
    } else {
        Box::new(ManifestRegistry)
    };

    let client = http_client(&settings)?;
    let collaborators = Collaborators {
        lookup: Box::new(IbgeLookup::new(client.clone(), &settings)),
        geocoder: Box::new(NominatimGeocoder::new(client.clone(), &settings)),
        network: Box::new(OverpassProvider::new(client, &settings)),
        registry,
        feedback: Box::new(TracingFeedback),
    };
    let pipeline = Pipeline::new(collaborators, PipelineOptions::from(&settings));

    let request = RunRequest {
        codes: args.codes.clone(),
        network_type: args.network_type,
        buffer_meters: args.buffer_meters,
        output: args.output.clone(),
    };
    let summary = pipeline.run(&request).await?;

    if let Some(path) = &args.report {
        summary
            .save_to_file(path)
            .context(format!("Failed to save report: {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    Ok(summary)
}
