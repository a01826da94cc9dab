//! Comparing a node's stored coordinates with geocoder candidates.

use geofix_database_models::NodeRow;
use geofix_geocoder::GeocodeCandidate;
use geofix_geocoder::selection::CandidateSelection;

use crate::{ComparisonRecord, CoordinatePair};

/// How candidates are chosen and compared.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompareOptions {
    /// Which candidate to compare when several come back.
    pub selection: CandidateSelection,
    /// When set, coordinates within this many degrees count as equal.
    /// When unset, coordinates must match as text.
    pub tolerance: Option<f64>,
}

/// Result of checking one node against a search response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The selected candidate agrees with the stored coordinates.
    Unchanged,
    /// The selected candidate disagrees.
    Changed(ComparisonRecord),
    /// The search returned no candidates.
    NotFound,
    /// Several candidates came back and the selection declined to pick.
    Ambiguous,
}

/// Checks a node against the candidates returned for its address.
#[must_use]
pub fn evaluate(
    node: &NodeRow,
    candidates: &[GeocodeCandidate],
    options: &CompareOptions,
) -> NodeOutcome {
    if candidates.is_empty() {
        return NodeOutcome::NotFound;
    }

    if candidates.len() > 1 {
        log::debug!(
            "{} candidates for '{}' (stored {:?} {:?})",
            candidates.len(),
            node.address.as_deref().unwrap_or_default(),
            node.longitude,
            node.latitude
        );
    }

    let Some(candidate) = options.selection.select(candidates, node.stored_point()) else {
        return NodeOutcome::Ambiguous;
    };

    compare_node(node, candidate, options.tolerance)
        .map_or(NodeOutcome::Unchanged, NodeOutcome::Changed)
}

/// Compares stored coordinates with a candidate.
///
/// Returns a record when either coordinate differs, `None` when both agree.
#[must_use]
pub fn compare_node(
    node: &NodeRow,
    candidate: &GeocodeCandidate,
    tolerance: Option<f64>,
) -> Option<ComparisonRecord> {
    let old_lon = node.longitude.as_deref().unwrap_or_default();
    let old_lat = node.latitude.as_deref().unwrap_or_default();

    let same = coordinate_eq(old_lon, &candidate.lon, tolerance)
        && coordinate_eq(old_lat, &candidate.lat, tolerance);

    if same {
        return None;
    }

    Some(ComparisonRecord {
        address: node.address.clone().unwrap_or_default(),
        old: CoordinatePair::new(old_lon, old_lat),
        new: CoordinatePair::new(candidate.lon.as_str(), candidate.lat.as_str()),
    })
}

fn coordinate_eq(stored: &str, geocoded: &str, tolerance: Option<f64>) -> bool {
    if stored == geocoded {
        return true;
    }

    let Some(tolerance) = tolerance else {
        return false;
    };

    match (stored.trim().parse::<f64>(), geocoded.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() <= tolerance,
        _ => false,
    }
}
