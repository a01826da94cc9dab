#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row and update types for the `nodes` table.
//!
//! Coordinates are carried as text exactly as `PostgreSQL` renders the
//! stored `REAL` values, so comparisons against geocoder output (which
//! also returns coordinates as strings) are textual.

/// A row of the `nodes` table as retrieved from the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRow {
    /// Primary key.
    pub node_id: i64,
    /// Short location name (e.g., a store name).
    pub location: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Street address, matched literally by the update stage.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State or province.
    pub state_province: Option<String>,
    /// ZIP / postal code.
    pub zip_postal_code: Option<String>,
    /// Stored longitude, as text.
    pub longitude: Option<String>,
    /// Stored latitude, as text.
    pub latitude: Option<String>,
}

impl NodeRow {
    /// Returns the stored coordinates parsed as `(longitude, latitude)`, or
    /// `None` if either is missing or not a number.
    #[must_use]
    pub fn stored_point(&self) -> Option<(f64, f64)> {
        let lon = self.longitude.as_deref()?.trim().parse::<f64>().ok()?;
        let lat = self.latitude.as_deref()?.trim().parse::<f64>().ok()?;
        Some((lon, lat))
    }
}

/// New coordinates for every node whose `address` equals `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCoordinateUpdate {
    /// Address to match (literal equality).
    pub address: String,
    /// New longitude, as text.
    pub longitude: String,
    /// New latitude, as text.
    pub latitude: String,
}
