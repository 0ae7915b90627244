//! Error taxonomy for place finding.
//!
//! Every failure is recoverable at the call site: the caller shows
//! [`PlaceError::user_message`] and keeps whatever results it already had.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaceError {
    /// The geocoder answered but had no match for the query.
    #[error("Location not found: '{0}'")]
    LocationNotFound(String),
    /// Network failure, non-success status, or an unparseable geocode answer.
    #[error("Location lookup failed: {0}")]
    LookupFailed(String),
    #[error("Place search failed: {0}")]
    SearchFailed(String),
    /// No usable device position. Callers fall back to the configured default centre.
    #[error("Device location unavailable: {0}")]
    GeolocationUnavailable(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Init logging error: {0}")]
    InitLogging(#[from] tracing_subscriber::filter::ParseError),
}

impl PlaceError {
    /// Short retryable message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::LocationNotFound(_) => "Location not found. Please try another search.",
            Self::LookupFailed(_) => "Failed to search location. Please try again.",
            Self::SearchFailed(_) => "Failed to search for places. Please try again.",
            Self::GeolocationUnavailable(_) => {
                "Unable to get your location. Using the default location."
            }
            Self::InvalidInput(_) => "Invalid input. Please check your search and try again.",
            Self::Config(_) | Self::Io(_) | Self::InitLogging(_) => {
                "Something went wrong. Please try again."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = PlaceError::LocationNotFound("Nowhereville123".into());
        assert_eq!(err.to_string(), "Location not found: 'Nowhereville123'");
        assert_eq!(err.user_message(), "Location not found. Please try another search.");
    }

    #[test]
    fn test_search_failed_message() {
        let err = PlaceError::SearchFailed("status 504".into());
        assert!(err.user_message().starts_with("Failed to search for places"));
    }
}
