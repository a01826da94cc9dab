#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for geofix.
//!
//! [`IndicatifProgress`] renders the geocoding pass of
//! [`geofix_audit::geocode_stage`] as a node counter. [`init_logger`] routes
//! `log` output through the same [`MultiProgress`], and [`confirm`] guards
//! the apply stage.

use std::sync::Arc;
use std::time::Duration;

use geofix_audit::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// An `indicatif` [`ProgressBar`] that tracks the per-node geocoding pass.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Counting style used once the node count is known.
    nodes_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Creates the bar for the geocoding pass.
    ///
    /// Spins while the `nodes` table is read, then counts nodes once
    /// [`ProgressCallback::set_total()`] reports how many were fetched. The
    /// message shows the address currently being geocoded.
    #[must_use]
    pub fn nodes_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let nodes_style = ProgressStyle::with_template(
            "{wide_bar:.green/dim} {pos}/{len} nodes [{elapsed_precise}<{eta}]\n  {wide_msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        Arc::new(Self { bar, nodes_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.disable_steady_tick();
        self.bar.set_style(self.nodes_style.clone());
        self.bar.set_length(total);
        self.bar.reset();
        self.bar.set_message(format!("{total} nodes fetched"));
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.abandon_with_message(msg);
    }
}

/// Initializes the global logger behind `indicatif-log-bridge`, so that log
/// lines are printed above the node bar instead of through it.
///
/// `RUST_LOG` overrides the default `info` level, which is the level the
/// per-node comparisons are logged at.
///
/// Returns the [`MultiProgress`] the node bar must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_err()
    {
        log::debug!("Logger already installed");
    }

    log::set_max_level(level);

    multi
}

/// Asks a yes/no question on the terminal.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read (e.g. stdin is not a
/// TTY).
pub fn confirm(prompt: &str, default: bool) -> Result<bool, dialoguer::Error> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
}
