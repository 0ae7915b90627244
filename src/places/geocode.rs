//! Free-text geocoding through OpenStreetMap Nominatim.

use super::types::Coordinate;
use crate::error::PlaceError;
use serde::Deserialize;
use std::time::Duration;

/// Resolves free text to the single best-matching coordinate.
pub trait Geocoder: Send + Sync {
    /// Callers skip blank queries; implementations may assume `query` is non-empty.
    fn geocode(&self, query: &str) -> Result<Coordinate, PlaceError>;
}

// ─── Response parsing ───────────────────────────────────────────

/// Nominatim sends coordinates as strings, but some mirrors send numbers.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn parse(&self, field: &str) -> Result<f64, PlaceError> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| PlaceError::LookupFailed(format!("bad {} '{}': {}", field, s, e)))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PlaceError::LookupFailed(format!("non-finite {}", field)))
        }
    }
}

/// One Nominatim hit. Only the coordinate is read; other fields are ignored.
#[derive(Deserialize, Debug, Clone)]
pub struct NominatimResult {
    pub lat: LooseNumber,
    pub lon: LooseNumber,
}

/// Take the first result of a Nominatim answer.
///
/// Zero results is `LocationNotFound`; an unparseable coordinate fails closed
/// as `LookupFailed`.
pub fn first_coordinate(query: &str, results: &[NominatimResult]) -> Result<Coordinate, PlaceError> {
    let first = results
        .first()
        .ok_or_else(|| PlaceError::LocationNotFound(query.to_string()))?;
    let lat = first.lat.parse("latitude")?;
    let lon = first.lon.parse("longitude")?;
    Ok(Coordinate::new(lat, lon))
}

// ─── Nominatim provider ─────────────────────────────────────────

pub struct NominatimGeocoder {
    agent: ureq::Agent,
    endpoint: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>, user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Coordinate, PlaceError> {
        tracing::debug!(query, endpoint = %self.endpoint, "geocoding");

        let response = self
            .agent
            .get(&self.endpoint)
            .query("q", query)
            .query("format", "json")
            .query("limit", "1")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => PlaceError::LookupFailed(format!("status {}", code)),
                ureq::Error::Transport(t) => PlaceError::LookupFailed(t.to_string()),
            })?;

        let results: Vec<NominatimResult> = response
            .into_json()
            .map_err(|e| PlaceError::LookupFailed(format!("invalid response: {}", e)))?;

        first_coordinate(query, &results)
    }
}
