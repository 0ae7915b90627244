//! Overpass interpreter client.
//!
//! Transport only: POST the query text, map HTTP failures, decode `elements`.

use super::query::OverpassQuery;
use super::types::RawFeature;
use crate::error::PlaceError;
use serde::Deserialize;
use std::time::Duration;

/// Runs a composed query against a feature-search service.
pub trait FeatureSource: Send + Sync {
    fn fetch(&self, query: &OverpassQuery) -> Result<Vec<RawFeature>, PlaceError>;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawFeature>,
    /// Set by the interpreter when the query timed out or ran out of memory.
    #[serde(default)]
    remark: Option<String>,
}

/// Decode an interpreter response body.
///
/// A `remark` with no elements is a server-side failure reported with status 200.
pub fn parse_elements(body: &str) -> Result<Vec<RawFeature>, PlaceError> {
    let decoded: OverpassResponse = serde_json::from_str(body)
        .map_err(|e| PlaceError::SearchFailed(format!("invalid Overpass JSON payload: {}", e)))?;
    match decoded.remark {
        Some(remark) if decoded.elements.is_empty() => Err(PlaceError::SearchFailed(remark)),
        _ => Ok(decoded.elements),
    }
}

pub struct OverpassSource {
    agent: ureq::Agent,
    endpoint: String,
}

impl OverpassSource {
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

impl FeatureSource for OverpassSource {
    fn fetch(&self, query: &OverpassQuery) -> Result<Vec<RawFeature>, PlaceError> {
        tracing::debug!(endpoint = %self.endpoint, statements = query.statement_count(), "posting overpass query");

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Accept", "application/json")
            .send_string(query.as_str())
            .map_err(|e| match e {
                ureq::Error::Status(code, response) => {
                    let body = response.into_string().unwrap_or_default();
                    PlaceError::SearchFailed(status_message(code, &body))
                }
                ureq::Error::Transport(t) => PlaceError::SearchFailed(t.to_string()),
            })?;

        let body = response
            .into_string()
            .map_err(|e| PlaceError::SearchFailed(e.to_string()))?;
        parse_elements(&body)
    }
}

fn status_message(code: u16, body: &str) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return format!("status {}", code);
    }
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("status {}: {}...", code, preview)
    } else {
        format!("status {}: {}", code, preview)
    }
}
