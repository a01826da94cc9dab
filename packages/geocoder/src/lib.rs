#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for node addresses.
//!
//! Resolves free-text node addresses to coordinates through a
//! Nominatim-compatible `/search` endpoint:
//!
//! 1. [`address`] cleans and percent-encodes the address and builds the
//!    search URL.
//! 2. [`nominatim`] issues the request and parses the candidate list.
//! 3. [`selection`] picks one candidate when several come back.
//!
//! Endpoints are configured via TOML files in `services/` and loaded from
//! the [`service_registry`].

pub mod address;
pub mod nominatim;
pub mod selection;
pub mod service_registry;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// A source of candidates for a node address.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns every candidate for the address, best first.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the lookup fails.
    async fn search(
        &self,
        address: &str,
        city: &str,
        state: &str,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}

/// One entry of a Nominatim search response.
///
/// Coordinates are kept as the strings the service returned so they can be
/// compared and stored without any float formatting round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeocodeCandidate {
    /// Human-readable match description.
    #[serde(default)]
    pub display_name: String,
    /// Latitude (WGS84), as text.
    pub lat: String,
    /// Longitude (WGS84), as text.
    pub lon: String,
}

impl GeocodeCandidate {
    /// Returns the candidate position as `(longitude, latitude)`, or `None`
    /// if either coordinate is not a number.
    #[must_use]
    pub fn point(&self) -> Option<(f64, f64)> {
        let lon = self.lon.trim().parse::<f64>().ok()?;
        let lat = self.lat.trim().parse::<f64>().ok()?;
        Some((lon, lat))
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP status {status} from {url}")]
    Status {
        /// Response status code.
        status: reqwest::StatusCode,
        /// Requested URL.
        url: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}
