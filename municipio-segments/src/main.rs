//! Point d'entrée CLI pour municipio-segments

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use municipio_segments::report::RunStatus;

mod cli;

/// Variables `OSMNET_*` depuis un `.env` du répertoire courant ou de celui du binaire
fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    let beside_binary = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")));
    if let Some(path) = beside_binary {
        dotenvy::from_path(path).ok();
    }
}

/// Télécharger les segments de rue OSM de municipalités IBGE dans un GeoPackage
#[derive(Parser)]
#[command(name = "municipio-segments")]
#[command(author, version)]
#[command(about = "Download OSM street segments for IBGE municipalities into one multi-layer GeoPackage")]
#[command(long_about = "Pour chaque code IBGE : limite municipale (Nominatim), buffer optionnel, \
réseau OSM (Overpass), projection UTM locale, puis une couche osm_segments_<code> \
par municipalité dans un GeoPackage unique.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    run: cli::RunArgs,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    load_env();
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    info!(
        codes = %cli.run.codes,
        network_type = %cli.run.network_type,
        buffer_meters = cli.run.buffer_meters,
        output = %cli.run.output.display(),
        "Starting run"
    );
    let summary = cli::cmd_run(&cli.run).await?;

    if !cli.quiet {
        summary.display();
    }
    info!("{}", summary.summary());

    Ok(match summary.status {
        RunStatus::Failed => ExitCode::from(2),
        RunStatus::Success | RunStatus::PartialSuccess => ExitCode::SUCCESS,
    })
}

/// `RUST_LOG` prioritaire ; sinon le niveau des options vaut pour nos crates
/// et les dépendances restent en `warn`
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,municipio_segments={level},osmnet={level}"))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(verbose > 0)
        .with_writer(std::io::stderr)
        .init();
}
