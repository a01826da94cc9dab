//! Nominatim / OpenStreetMap search client.
//!
//! The public instance allows at most **1 request per second** and
//! requires an identifying `User-Agent`. Rate limiting is the caller's job
//! (see `rate_limit_ms` in the service TOML configuration).
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;

use crate::address::build_search_url;
use crate::service_registry::GeocodingService;
use crate::{GeocodeCandidate, GeocodeError, Geocoder};

/// [`Geocoder`] backed by a Nominatim-compatible search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Creates a geocoder for `base_url` using an existing client.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Creates a geocoder for a configured service.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn for_service(
        service: &GeocodingService,
        timeout: Option<Duration>,
    ) -> Result<Self, GeocodeError> {
        let client = build_client(service.user_agent(), timeout)?;
        Ok(Self::new(client, service.base_url()))
    }

    /// Search URL this geocoder sends requests to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(
        &self,
        address: &str,
        city: &str,
        state: &str,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        search_address(&self.client, &self.base_url, address, city, state).await
    }
}

/// Builds the HTTP client used for every search request.
///
/// # Errors
///
/// Returns [`GeocodeError::Http`] if the TLS backend cannot be initialised.
pub fn build_client(
    user_agent: &str,
    timeout: Option<Duration>,
) -> Result<reqwest::Client, GeocodeError> {
    let mut builder = reqwest::Client::builder().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Searches for an address and returns every candidate, in the order the
/// service ranked them.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails, the service answers
/// with a non-success status, or the body is not a candidate list.
pub async fn search_address(
    client: &reqwest::Client,
    base_url: &str,
    address: &str,
    city: &str,
    state: &str,
) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    let url = build_search_url(base_url, address, city, state);
    log::debug!("GET {url}");
    search(client, &url).await
}

/// Issues a GET for an already-built search URL.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails, the service answers
/// with a non-success status, or the body is not a candidate list.
pub async fn search(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    let resp = client.get(url).send().await?;

    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }
    if !status.is_success() {
        return Err(GeocodeError::Status {
            status,
            url: url.to_string(),
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_candidates(body)
}

/// Parses a Nominatim JSON response into candidates.
fn parse_candidates(body: serde_json::Value) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    if !body.is_array() {
        return Err(GeocodeError::Parse {
            message: "Nominatim response is not an array".to_string(),
        });
    }

    serde_json::from_value(body).map_err(|e| GeocodeError::Parse {
        message: format!("Invalid Nominatim candidate: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_candidate() {
        let body = serde_json::json!([{
            "place_id": 123,
            "lat": "37.2",
            "lon": "-121.9",
            "display_name": "42, Main Street, Brentwood, CA, USA",
            "address": { "city": "Brentwood" }
        }]);
        let candidates = parse_candidates(body).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].lat, "37.2");
        assert_eq!(candidates[0].lon, "-121.9");
        assert_eq!(candidates[0].display_name, "42, Main Street, Brentwood, CA, USA");
    }

    #[test]
    fn keeps_service_order() {
        let body = serde_json::json!([
            { "lat": "1", "lon": "2", "display_name": "first" },
            { "lat": "3", "lon": "4", "display_name": "second" }
        ]);
        let candidates = parse_candidates(body).unwrap();
        assert_eq!(candidates[0].display_name, "first");
        assert_eq!(candidates[1].display_name, "second");
    }

    #[test]
    fn parses_empty() {
        let body = serde_json::json!([]);
        assert!(parse_candidates(body).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(matches!(
            parse_candidates(body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_candidate_without_coordinates() {
        let body = serde_json::json!([{ "display_name": "nowhere" }]);
        assert!(matches!(
            parse_candidates(body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
