#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate comparison records and the intermediate comparisons file.
//!
//! The geocode stage produces a [`ComparisonRecord`] for every node whose
//! stored coordinates disagree with the geocoder. Records are written to a
//! CSV file ([`file::write_comparisons`]) that a human can review before the
//! apply stage reads it back ([`file::read_updates`]).

pub mod compare;
pub mod file;

use std::fmt;

use geofix_database_models::NodeCoordinateUpdate;
use thiserror::Error;

/// A `(longitude, latitude)` pair kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatePair {
    /// Longitude, as text.
    pub longitude: String,
    /// Latitude, as text.
    pub latitude: String,
}

impl CoordinatePair {
    /// Creates a pair from longitude and latitude text.
    #[must_use]
    pub fn new(longitude: impl Into<String>, latitude: impl Into<String>) -> Self {
        Self {
            longitude: longitude.into(),
            latitude: latitude.into(),
        }
    }

    /// Parses the `"{longitude} {latitude}"` form written by [`fmt::Display`].
    ///
    /// The value must split on a single space into exactly two non-empty
    /// parts.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(' ');
        let longitude = parts.next().filter(|s| !s.is_empty())?;
        let latitude = parts.next().filter(|s| !s.is_empty())?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(longitude, latitude))
    }
}

impl fmt::Display for CoordinatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.longitude, self.latitude)
    }
}

/// A node whose stored coordinates differ from the geocoded ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRecord {
    /// Node address, exactly as stored.
    pub address: String,
    /// Stored coordinates. Empty strings when the column was `NULL`.
    pub old: CoordinatePair,
    /// Geocoded coordinates.
    pub new: CoordinatePair,
}

impl ComparisonRecord {
    /// Returns the update that moves the node to the geocoded coordinates.
    #[must_use]
    pub fn to_update(&self) -> NodeCoordinateUpdate {
        NodeCoordinateUpdate {
            address: self.address.clone(),
            longitude: self.new.longitude.clone(),
            latitude: self.new.latitude.clone(),
        }
    }
}

/// Errors reading or writing the comparisons file.
#[derive(Debug, Error)]
pub enum ComparisonFileError {
    /// The file could not be opened or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A data row does not have the expected shape.
    #[error("Malformed row at line {line}: {message}")]
    MalformedRow {
        /// 1-based line number in the file.
        line: u64,
        /// Description of the problem.
        message: String,
    },
}
