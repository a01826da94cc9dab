#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Audits stored node coordinates against a geocoder and applies the
//! corrections.
//!
//! The audit runs in two stages joined by a CSV file:
//!
//! 1. [`geocode_stage`] reads every node, geocodes its address, and writes
//!    each disagreement to the comparisons file.
//! 2. [`apply_stage`] reads that file back and updates the matching nodes
//!    in a single transaction.
//!
//! The file is the only hand-off between the stages so it can be reviewed
//! (or edited) before anything is written to the database.

pub mod progress;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use geofix_comparisons::compare::{CompareOptions, NodeOutcome, evaluate};
use geofix_comparisons::file::{read_updates, write_comparisons};
use geofix_comparisons::{ComparisonFileError, ComparisonRecord};
use geofix_database::DbError;
use geofix_database::db::{self, DbConfig};
use geofix_database::queries::{self, UpdateSummary};
use geofix_database_models::{NodeCoordinateUpdate, NodeRow};
use geofix_geocoder::address::is_geocodable;
use geofix_geocoder::{GeocodeError, Geocoder};
use thiserror::Error;

use crate::progress::ProgressCallback;

/// Errors that abort an audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Database connection, query or transaction failure.
    #[error(transparent)]
    Database(#[from] DbError),

    /// The comparisons file could not be read or written.
    #[error(transparent)]
    File(#[from] ComparisonFileError),

    /// The geocoder failed for a node. Comparisons collected before the
    /// failure were written to the file.
    #[error(
        "Geocoding node {node_id} ('{address}') failed ({checkpointed} earlier comparisons saved): {source}"
    )]
    Geocode {
        /// Node being geocoded when the failure happened.
        node_id: i64,
        /// Its address.
        address: String,
        /// Number of comparisons flushed to the file before aborting.
        checkpointed: usize,
        /// Underlying error.
        #[source]
        source: GeocodeError,
    },
}

/// Options for the geocode stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeocodeOptions {
    /// Candidate selection and comparison settings.
    pub compare: CompareOptions,
    /// Pause between consecutive geocoder requests.
    pub request_delay: Duration,
}

/// Per-outcome node counts for one geocode pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    /// Nodes examined.
    pub nodes: u64,
    /// Nodes without a usable address (never sent to the geocoder).
    pub skipped: u64,
    /// Addresses the geocoder could not find.
    pub not_found: u64,
    /// Multi-candidate responses the selection declined to resolve.
    pub ambiguous: u64,
    /// Nodes whose coordinates already agree.
    pub unchanged: u64,
    /// Nodes whose coordinates differ.
    pub changed: u64,
}

/// A geocoder failure that stopped a pass.
#[derive(Debug)]
pub struct NodeFailure {
    /// Node being geocoded.
    pub node_id: i64,
    /// Its address.
    pub address: String,
    /// What went wrong.
    pub error: GeocodeError,
}

/// Output of [`diff_nodes`].
#[derive(Debug, Default)]
pub struct DiffReport {
    /// Disagreements found, in node order.
    pub records: Vec<ComparisonRecord>,
    /// Counts by outcome.
    pub summary: GeocodeSummary,
    /// Set when the pass stopped early because the geocoder failed.
    pub failure: Option<NodeFailure>,
}

/// Geocodes every node and collects the disagreements.
///
/// Nodes whose address is empty or contains `Address not available` are
/// skipped without a request. Requests are made one at a time, with
/// `options.request_delay` between them. The pass stops at the first
/// geocoder error and reports it in [`DiffReport::failure`] alongside the
/// records gathered so far.
pub async fn diff_nodes(
    nodes: &[NodeRow],
    geocoder: &dyn Geocoder,
    options: &GeocodeOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> DiffReport {
    let mut report = DiffReport::default();
    let mut requested = 0u64;

    progress.set_total(nodes.len() as u64);

    for node in nodes {
        report.summary.nodes += 1;

        let address = node.address.as_deref().unwrap_or_default();
        if !is_geocodable(address) {
            log::debug!("Skipping node {}: no usable address", node.node_id);
            report.summary.skipped += 1;
            progress.inc(1);
            continue;
        }

        if requested > 0 && !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }
        requested += 1;

        progress.set_message(format!("Geocoding {address}"));

        let city = node.city.as_deref().unwrap_or_default();
        let state = node.state_province.as_deref().unwrap_or_default();

        let candidates = match geocoder.search(address, city, state).await {
            Ok(candidates) => candidates,
            Err(error) => {
                log::error!("Geocoding '{address}' failed: {error}");
                report.failure = Some(NodeFailure {
                    node_id: node.node_id,
                    address: address.to_string(),
                    error,
                });
                break;
            }
        };

        match evaluate(node, &candidates, &options.compare) {
            NodeOutcome::NotFound => {
                log::info!("Skipping '{address}': not found");
                report.summary.not_found += 1;
            }
            NodeOutcome::Ambiguous => {
                log::info!(
                    "Skipping '{address}': {} candidates and no clear match",
                    candidates.len()
                );
                report.summary.ambiguous += 1;
            }
            NodeOutcome::Unchanged => {
                report.summary.unchanged += 1;
            }
            NodeOutcome::Changed(record) => {
                log::info!(
                    "'{}' old coords ({}) new coords ({})",
                    record.address,
                    record.old,
                    record.new
                );
                report.summary.changed += 1;
                report.records.push(record);
            }
        }

        progress.inc(1);
    }

    report
}

/// Runs the geocode stage: fetch nodes, geocode, write the comparisons file.
///
/// The database connection is closed before geocoding starts. If the
/// geocoder fails part-way, the comparisons found so far are still written
/// to `output` before [`AuditError::Geocode`] is returned.
///
/// # Errors
///
/// Returns [`AuditError`] if the database cannot be read, the geocoder
/// fails, or the file cannot be written.
pub async fn geocode_stage(
    db_config: &DbConfig,
    geocoder: &dyn Geocoder,
    options: &GeocodeOptions,
    output: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<GeocodeSummary, AuditError> {
    let nodes = {
        let db = db::connect(db_config).await?;
        queries::fetch_all_nodes(db.as_ref()).await?
    };

    let report = diff_nodes(&nodes, geocoder, options, progress).await;

    finish_geocode(report, output, progress)
}

/// Writes a pass's records to `output` and turns its failure, if any, into
/// an error.
///
/// The file is written even when the pass stopped early, so the records
/// gathered before the failure survive as a checkpoint.
///
/// # Errors
///
/// Returns [`AuditError::File`] if the file cannot be written, or
/// [`AuditError::Geocode`] if the pass stopped on a geocoder failure.
pub fn finish_geocode(
    report: DiffReport,
    output: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<GeocodeSummary, AuditError> {
    write_comparisons(output, &report.records)?;

    if let Some(failure) = report.failure {
        progress.finish("Geocoding aborted".to_string());
        return Err(AuditError::Geocode {
            node_id: failure.node_id,
            address: failure.address,
            checkpointed: report.records.len(),
            source: failure.error,
        });
    }

    let summary = report.summary;
    progress.finish(format!(
        "Geocoded {} nodes: {} changed",
        summary.nodes, summary.changed
    ));
    log::info!(
        "{} nodes: {} changed, {} unchanged, {} not found, {} ambiguous, {} skipped",
        summary.nodes,
        summary.changed,
        summary.unchanged,
        summary.not_found,
        summary.ambiguous,
        summary.skipped
    );

    Ok(summary)
}

/// Reads the updates recorded in a comparisons file.
///
/// The whole file is validated before anything touches the database, so a
/// malformed row aborts the run with no updates applied.
///
/// # Errors
///
/// Returns [`AuditError::File`] if the file cannot be read or a row is
/// malformed.
pub fn load_updates(path: &Path) -> Result<Vec<NodeCoordinateUpdate>, AuditError> {
    Ok(read_updates(path)?)
}

/// Runs the apply stage: write `updates` to the `nodes` table in one
/// transaction.
///
/// With `dry_run` set, the updates are only logged.
///
/// # Errors
///
/// Returns [`AuditError::Database`] if the connection, any update, or the
/// commit fails. Nothing is committed in that case.
pub async fn apply_stage(
    db_config: &DbConfig,
    updates: &[NodeCoordinateUpdate],
    dry_run: bool,
) -> Result<UpdateSummary, AuditError> {
    if dry_run {
        for update in updates {
            log::info!(
                "[dry run] UPDATE nodes SET long = '{}', lat = '{}' WHERE address = '{}'",
                update.longitude,
                update.latitude,
                update.address
            );
        }
        return Ok(UpdateSummary {
            statements: updates.len() as u64,
            ..UpdateSummary::default()
        });
    }

    if updates.is_empty() {
        log::info!("No updates to apply");
        return Ok(UpdateSummary::default());
    }

    let db = db::connect(db_config).await?;
    let summary = queries::apply_coordinate_updates(db.as_ref(), updates).await?;

    Ok(summary)
}
