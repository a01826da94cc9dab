//! Choosing one candidate from a multi-result search.
//!
//! Nominatim ranks candidates by its own importance score, which does not
//! always favour the place a node actually refers to. [`CandidateSelection`]
//! decides which candidate (if any) is compared against the stored
//! coordinates.

use std::fmt;
use std::str::FromStr;

use geo::{Distance as _, Haversine, Point};

use crate::GeocodeCandidate;

/// Strategy for picking a candidate when a search returns several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CandidateSelection {
    /// Take the service's top-ranked candidate.
    #[default]
    First,
    /// Take the candidate closest (haversine) to the stored coordinates.
    /// Falls back to the first candidate when the stored coordinates are
    /// missing or no candidate has a parsable position.
    Nearest,
    /// Treat multi-candidate responses as ambiguous and select nothing.
    SkipAmbiguous,
}

impl CandidateSelection {
    /// Selects a candidate.
    ///
    /// `stored` is the node's current `(longitude, latitude)`, if known.
    /// Returns `None` for an empty list, and for any list longer than one
    /// under [`Self::SkipAmbiguous`].
    #[must_use]
    pub fn select<'a>(
        self,
        candidates: &'a [GeocodeCandidate],
        stored: Option<(f64, f64)>,
    ) -> Option<&'a GeocodeCandidate> {
        match candidates {
            [] => None,
            [only] => Some(only),
            [first, ..] => match self {
                Self::First => Some(first),
                Self::SkipAmbiguous => None,
                Self::Nearest => stored
                    .and_then(|origin| nearest(candidates, origin))
                    .or(Some(first)),
            },
        }
    }
}

/// Returns the candidate with the smallest great-circle distance to
/// `origin` (`(longitude, latitude)`), ignoring unparsable candidates.
fn nearest(candidates: &[GeocodeCandidate], origin: (f64, f64)) -> Option<&GeocodeCandidate> {
    let origin = Point::new(origin.0, origin.1);

    candidates
        .iter()
        .filter_map(|c| {
            let (lon, lat) = c.point()?;
            let meters = Haversine.distance(origin, Point::new(lon, lat));
            log::debug!("  candidate '{}' is {meters:.0}m away", c.display_name);
            Some((meters, c))
        })
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, c)| c)
}

impl FromStr for CandidateSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "nearest" => Ok(Self::Nearest),
            "skip" | "skip-ambiguous" | "skip_ambiguous" => Ok(Self::SkipAmbiguous),
            other => Err(format!(
                "Unknown selection '{other}' (expected first, nearest or skip-ambiguous)"
            )),
        }
    }
}

impl fmt::Display for CandidateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Nearest => f.write_str("nearest"),
            Self::SkipAmbiguous => f.write_str("skip-ambiguous"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, lon: &str, lat: &str) -> GeocodeCandidate {
        GeocodeCandidate {
            display_name: name.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }

    fn two_candidates() -> Vec<GeocodeCandidate> {
        vec![
            candidate("far", "-118.24", "34.05"),
            candidate("near", "-121.70", "37.93"),
        ]
    }

    #[test]
    fn empty_selects_nothing() {
        for mode in [
            CandidateSelection::First,
            CandidateSelection::Nearest,
            CandidateSelection::SkipAmbiguous,
        ] {
            assert!(mode.select(&[], Some((-121.7, 37.9))).is_none());
        }
    }

    #[test]
    fn single_candidate_always_selected() {
        let only = vec![candidate("only", "-121.9", "37.2")];
        assert_eq!(
            CandidateSelection::SkipAmbiguous
                .select(&only, None)
                .map(|c| c.display_name.as_str()),
            Some("only")
        );
    }

    #[test]
    fn first_takes_top_ranked() {
        let candidates = two_candidates();
        let picked = CandidateSelection::First
            .select(&candidates, Some((-121.7, 37.9)))
            .unwrap();
        assert_eq!(picked.display_name, "far");
    }

    #[test]
    fn nearest_takes_closest_to_stored() {
        let candidates = two_candidates();
        let picked = CandidateSelection::Nearest
            .select(&candidates, Some((-121.7, 37.9)))
            .unwrap();
        assert_eq!(picked.display_name, "near");
    }

    #[test]
    fn nearest_without_stored_falls_back_to_first() {
        let candidates = two_candidates();
        let picked = CandidateSelection::Nearest.select(&candidates, None).unwrap();
        assert_eq!(picked.display_name, "far");
    }

    #[test]
    fn nearest_ignores_unparsable_candidates() {
        let candidates = vec![
            candidate("broken", "n/a", "n/a"),
            candidate("ok", "-121.0", "37.0"),
        ];
        let picked = CandidateSelection::Nearest
            .select(&candidates, Some((-121.7, 37.9)))
            .unwrap();
        assert_eq!(picked.display_name, "ok");
    }

    #[test]
    fn skip_ambiguous_rejects_multiple() {
        assert!(
            CandidateSelection::SkipAmbiguous
                .select(&two_candidates(), Some((-121.7, 37.9)))
                .is_none()
        );
    }

    #[test]
    fn parses_from_str() {
        assert_eq!("nearest".parse(), Ok(CandidateSelection::Nearest));
        assert_eq!("Skip-Ambiguous".parse(), Ok(CandidateSelection::SkipAmbiguous));
        assert!("closest".parse::<CandidateSelection>().is_err());
    }
}
