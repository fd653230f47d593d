//! Location extraction from resolved map URLs.
//!
//! Extractors are pure and tried in order; the first hit wins.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use url::Url;

use crate::models::ResolvedMapLink;

const MAPS_BASE: &str = "https://www.google.com/maps";
const EMBED_SEGMENT: &str = "/maps/embed";
const PLACE_ZOOM: u8 = 16;

/// Characters a URI component leaves as-is; everything else is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static PLACE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!3d(-?\d+\.\d+)!4d(-?\d+\.\d+)").expect("place marker regex"));
static VIEWPORT_CENTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").expect("viewport regex"));
static CENTER_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"center=(-?\d+\.\d+),(-?\d+\.\d+)").expect("center regex"));

/// Where the embedded map should point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapTarget {
    /// Coordinates kept as the source text so no precision is lost.
    Coordinates {
        lat: String,
        lng: String,
        zoom: Option<u8>,
    },
    /// Free-text search term.
    Query(String),
}

type Extractor = fn(&str) -> Option<MapTarget>;

/// Precedence order: exact place marker, viewport center, `center=`, `q=`.
const EXTRACTORS: [Extractor; 4] = [place_marker, viewport_center, center_param, query_param];

fn capture_pair(re: &Regex, url: &str, zoom: Option<u8>) -> Option<MapTarget> {
    let caps = re.captures(url)?;
    Some(MapTarget::Coordinates {
        lat: caps[1].to_string(),
        lng: caps[2].to_string(),
        zoom,
    })
}

/// `!3dLAT!4dLNG` from a place link's data blob.
pub fn place_marker(url: &str) -> Option<MapTarget> {
    capture_pair(&PLACE_MARKER, url, Some(PLACE_ZOOM))
}

/// `@LAT,LNG` viewport center.
pub fn viewport_center(url: &str) -> Option<MapTarget> {
    capture_pair(&VIEWPORT_CENTER, url, Some(PLACE_ZOOM))
}

/// `center=LAT,LNG` query parameter.
pub fn center_param(url: &str) -> Option<MapTarget> {
    capture_pair(&CENTER_PARAM, url, None)
}

/// Non-empty `q` query parameter.
pub fn query_param(url: &str) -> Option<MapTarget> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, value)| *key == "q" && !value.is_empty())
        .map(|(_, value)| MapTarget::Query(value.into_owned()))
}

/// Run the extractors, falling back to the whole URL as a search term.
pub fn extract(url: &str) -> MapTarget {
    EXTRACTORS
        .iter()
        .find_map(|extractor| extractor(url))
        .unwrap_or_else(|| MapTarget::Query(url.to_string()))
}

impl MapTarget {
    pub fn into_link(self, final_url: String) -> ResolvedMapLink {
        match self {
            MapTarget::Coordinates { lat, lng, zoom } => {
                let zoom = zoom.map(|z| format!("&z={z}")).unwrap_or_default();
                ResolvedMapLink {
                    embed_url: format!("{MAPS_BASE}?q={lat},{lng}{zoom}&output=embed"),
                    direction_url: format!("{MAPS_BASE}/dir/?api=1&destination={lat},{lng}"),
                    final_url,
                }
            }
            MapTarget::Query(term) => {
                let term = utf8_percent_encode(&term, COMPONENT).to_string();
                ResolvedMapLink {
                    embed_url: format!("{MAPS_BASE}?q={term}&output=embed"),
                    direction_url: format!("{MAPS_BASE}?q={term}"),
                    final_url,
                }
            }
        }
    }
}

/// Build the link pair for a fully redirected URL.
pub fn link_for(final_url: &str) -> ResolvedMapLink {
    if final_url.contains(EMBED_SEGMENT) {
        return ResolvedMapLink {
            embed_url: final_url.to_string(),
            direction_url: final_url.replacen(EMBED_SEGMENT, "/maps", 1),
            final_url: final_url.to_string(),
        };
    }
    extract(final_url).into_link(final_url.to_string())
}
