#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the node coordinate audit.
//!
//! Uses `indicatif-log-bridge` (via [`geofix_cli_utils::init_logger`]) to
//! route `log` output through `indicatif::MultiProgress` so that log lines
//! and the geocoding progress bar never fight for the terminal.

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use geofix_audit::{GeocodeOptions, apply_stage, geocode_stage, load_updates};
use geofix_cli_utils::{IndicatifProgress, MultiProgress, confirm};
use geofix_comparisons::compare::CompareOptions;
use geofix_comparisons::file::DEFAULT_FILE_NAME;
use geofix_database::db::DbConfig;
use geofix_geocoder::nominatim::NominatimGeocoder;
use geofix_geocoder::selection::CandidateSelection;
use geofix_geocoder::service_registry::{self, GeocodingService};

#[derive(Parser)]
#[command(
    name = "geofix",
    about = "Audit node coordinates against a geocoder and apply corrections"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Comparisons file written by `geocode` and read by `apply`
    #[arg(long, global = true, default_value = DEFAULT_FILE_NAME)]
    file: PathBuf,

    /// Geocoding service ID (defaults to the highest-priority enabled one)
    #[arg(long, global = true)]
    service: Option<String>,

    /// Candidate to compare when several come back: first, nearest or skip-ambiguous
    #[arg(long, global = true, default_value_t = CandidateSelection::First)]
    selection: CandidateSelection,

    /// Treat coordinates within this many degrees as equal
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Pause between geocoder requests (overrides the service setting)
    #[arg(long, global = true)]
    rate_limit_ms: Option<u64>,

    /// HTTP timeout for geocoder requests
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log the updates instead of writing them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Apply updates without asking for confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Geocode every node and write mismatches to the comparisons file
    Geocode,
    /// Apply the comparisons file to the nodes table (asks first unless --yes)
    Apply,
    /// Geocode then apply (the default). Without a terminal, pass --yes or --dry-run
    Run,
    /// List configured geocoding services
    Services,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = geofix_cli_utils::init_logger();
    let cli = Cli::parse();

    let start = Instant::now();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Services => {
            list_services();
            return Ok(());
        }
        Commands::Geocode => {
            let db_config = DbConfig::from_env()?;
            run_geocode(&cli, &db_config, &multi).await?;
        }
        Commands::Apply => {
            ensure_confirmable(&cli, std::io::stdin().is_terminal())?;
            let db_config = DbConfig::from_env()?;
            run_apply(&cli, &db_config).await?;
        }
        Commands::Run => {
            ensure_confirmable(&cli, std::io::stdin().is_terminal())?;
            let db_config = DbConfig::from_env()?;
            run_geocode(&cli, &db_config, &multi).await?;
            run_apply(&cli, &db_config).await?;
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}

/// Fails up front when the apply confirmation could not be answered, so a
/// non-interactive `run` stops before geocoding instead of after it.
fn ensure_confirmable(cli: &Cli, interactive: bool) -> Result<(), String> {
    if cli.dry_run || cli.yes || interactive {
        return Ok(());
    }
    Err("stdin is not a terminal, pass --yes to apply without confirmation or --dry-run".to_string())
}

fn list_services() {
    let services = service_registry::all_services();
    println!("{:<12} {:<8} {:<9} NAME", "ID", "ENABLED", "PRIORITY");
    println!("{}", "-".repeat(50));
    for service in &services {
        println!(
            "{:<12} {:<8} {:<9} {}",
            service.id, service.enabled, service.priority, service.name
        );
    }
}

fn resolve_service(id: Option<&str>) -> Result<GeocodingService, Box<dyn std::error::Error>> {
    let service = match id {
        Some(id) => service_registry::find_service(id)
            .ok_or_else(|| format!("Unknown geocoding service: {id}"))?,
        None => service_registry::default_service().ok_or("No geocoding service is enabled")?,
    };

    if !service.enabled {
        log::warn!("Using disabled geocoding service '{}'", service.id);
    }

    Ok(service)
}

async fn run_geocode(
    cli: &Cli,
    db_config: &DbConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = resolve_service(cli.service.as_deref())?;
    let geocoder =
        NominatimGeocoder::for_service(&service, cli.timeout_secs.map(Duration::from_secs))?;

    log::info!(
        "Geocoding with {} ({})",
        service.name,
        geocoder.base_url()
    );

    let options = GeocodeOptions {
        compare: CompareOptions {
            selection: cli.selection,
            tolerance: cli.tolerance,
        },
        request_delay: Duration::from_millis(
            cli.rate_limit_ms.unwrap_or_else(|| service.rate_limit_ms()),
        ),
    };

    let progress = IndicatifProgress::nodes_bar(multi, "Fetching nodes");
    let summary = geocode_stage(db_config, &geocoder, &options, &cli.file, &progress).await?;

    log::info!(
        "{} of {} nodes need new coordinates",
        summary.changed,
        summary.nodes
    );

    Ok(())
}

async fn run_apply(cli: &Cli, db_config: &DbConfig) -> Result<(), Box<dyn std::error::Error>> {
    let updates = load_updates(&cli.file)?;

    if updates.is_empty() {
        log::info!("{} lists no updates", cli.file.display());
        return Ok(());
    }

    if !cli.dry_run
        && !cli.yes
        && !confirm(
            &format!("Update coordinates for {} addresses?", updates.len()),
            false,
        )?
    {
        log::info!("Aborted, nothing was written");
        return Ok(());
    }

    let summary = apply_stage(db_config, &updates, cli.dry_run).await?;

    if cli.dry_run {
        log::info!("[dry run] {} updates not applied", summary.statements);
    } else {
        log::info!(
            "Applied {} updates ({} rows changed, {} addresses unmatched)",
            summary.statements,
            summary.rows_affected,
            summary.unmatched
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("geofix").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert_eq!(cli.file, PathBuf::from(DEFAULT_FILE_NAME));
        assert_eq!(cli.selection, CandidateSelection::First);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["apply", "--file", "out.csv", "--yes"]);
        assert!(matches!(cli.command, Some(Commands::Apply)));
        assert_eq!(cli.file, PathBuf::from("out.csv"));
        assert!(cli.yes);
    }

    #[test]
    fn non_interactive_run_needs_yes_or_dry_run() {
        assert!(ensure_confirmable(&parse(&["run"]), false).is_err());
        assert!(ensure_confirmable(&parse(&["run", "--yes"]), false).is_ok());
        assert!(ensure_confirmable(&parse(&["run", "--dry-run"]), false).is_ok());
        assert!(ensure_confirmable(&parse(&["run"]), true).is_ok());
    }
}
