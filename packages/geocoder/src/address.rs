//! Address cleaning and URL encoding for node addresses.
//!
//! Node addresses are hand-entered and often carry punctuation or a
//! highway suffix that confuses the geocoder:
//! - Trailing punctuation: `"Safeway-Brentwood #2621, Hwy 4."`
//! - Doubled spaces: `"100  Main St"`
//! - Placeholders: `"Address not available"`
//!
//! This module strips that noise and builds the search URL.

use regex::Regex;
use std::sync::LazyLock;

/// Placeholder text marking a node with no usable address.
pub const ADDRESS_NOT_AVAILABLE: &str = "Address not available";

/// Venue suffix that the geocoder cannot resolve.
const HIGHWAY_SUFFIX: &str = "Hwy 4";

/// Regex for runs of two or more spaces.
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// Returns `false` for addresses that should never be sent to the
/// geocoder.
#[must_use]
pub fn is_geocodable(address: &str) -> bool {
    !address.trim().is_empty() && !address.contains(ADDRESS_NOT_AVAILABLE)
}

/// Removes `.` and `,`, collapses repeated spaces, drops the `Hwy 4`
/// suffix and trims.
#[must_use]
pub fn clean_address(raw: &str) -> String {
    let addr: String = raw.chars().filter(|c| !matches!(c, '.' | ',')).collect();
    let addr = MULTI_SPACE_RE.replace_all(&addr, " ");
    let addr = addr.replace(HIGHWAY_SUFFIX, "");
    let addr = MULTI_SPACE_RE.replace_all(&addr, " ");

    addr.trim().to_string()
}

/// Cleans an address and percent-encodes it for a URL query string.
///
/// `"Safeway-Brentwood #2621, Hwy 4."` becomes
/// `"Safeway-Brentwood%20%232621"`.
#[must_use]
pub fn encode_for_url(raw: &str) -> String {
    log::debug!("Encoding address: {raw}");
    urlencoding::encode(&clean_address(raw)).into_owned()
}

/// Builds a free-form search URL for an address, city and state.
///
/// The query is `"{address} {city} {state}"` with the city trimmed and all
/// spaces removed from the state, followed by `format=json` and
/// `addressdetails=1`.
#[must_use]
pub fn build_search_url(base_url: &str, address: &str, city: &str, state: &str) -> String {
    let state: String = state.chars().filter(|c| *c != ' ').collect();
    format!(
        "{base_url}?q={}%20{}%20{}&format=json&addressdetails=1",
        encode_for_url(address),
        urlencoding::encode(city.trim()),
        urlencoding::encode(&state),
    )
}
