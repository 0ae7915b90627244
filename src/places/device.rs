//! Device position. A terminal program has no GPS, so this asks an IP
//! geolocation service, and falls back to a fixed default centre when that
//! is not possible.

use super::types::Coordinate;
use crate::error::PlaceError;
use serde::Deserialize;
use std::time::Duration;

pub trait DeviceLocator: Send + Sync {
    fn locate(&self) -> Result<Coordinate, PlaceError>;
}

/// Where the search ends up centred, and why.
#[derive(Debug)]
pub struct DevicePosition {
    pub coordinate: Coordinate,
    /// Set when the locator failed and `coordinate` is the default centre.
    pub fallback: Option<PlaceError>,
}

/// Locate the device, or use `default` when the locator is unavailable.
pub fn locate_or_default(locator: Option<&dyn DeviceLocator>, default: Coordinate) -> DevicePosition {
    let result = match locator {
        Some(locator) => locator.locate(),
        None => Err(PlaceError::GeolocationUnavailable("no device locator configured".into())),
    };
    match result {
        Ok(coordinate) => DevicePosition { coordinate, fallback: None },
        Err(e) => {
            let e = match e {
                PlaceError::GeolocationUnavailable(_) => e,
                other => PlaceError::GeolocationUnavailable(other.to_string()),
            };
            tracing::warn!(error = %e, fallback = %default, "using default centre");
            DevicePosition {
                coordinate: default,
                fallback: Some(e),
            }
        }
    }
}

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// IP-based geolocation via an ipapi.co-compatible endpoint.
pub struct IpLocator {
    agent: ureq::Agent,
    endpoint: String,
}

impl IpLocator {
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

impl DeviceLocator for IpLocator {
    fn locate(&self) -> Result<Coordinate, PlaceError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .call()
            .map_err(|e| PlaceError::GeolocationUnavailable(e.to_string()))?;

        let r: IpApiResult = response
            .into_json()
            .map_err(|e| PlaceError::GeolocationUnavailable(e.to_string()))?;

        let lat = r.latitude.ok_or_else(|| PlaceError::GeolocationUnavailable("no latitude".into()))?;
        let lon = r.longitude.ok_or_else(|| PlaceError::GeolocationUnavailable("no longitude".into()))?;
        Coordinate::checked(lat, lon).map_err(|e| PlaceError::GeolocationUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Coordinate, ()>);

    impl DeviceLocator for Fixed {
        fn locate(&self) -> Result<Coordinate, PlaceError> {
            self.0.map_err(|_| PlaceError::LookupFailed("timed out".into()))
        }
    }

    const ACCRA: Coordinate = Coordinate::new(5.6037, -0.187);

    #[test]
    fn test_located() {
        let locator = Fixed(Ok(Coordinate::new(59.3, 18.0)));
        let pos = locate_or_default(Some(&locator), ACCRA);
        assert_eq!(pos.coordinate, Coordinate::new(59.3, 18.0));
        assert!(pos.fallback.is_none());
    }

    #[test]
    fn test_failure_uses_default() {
        let pos = locate_or_default(Some(&Fixed(Err(()))), ACCRA);
        assert_eq!(pos.coordinate, ACCRA);
        assert!(matches!(pos.fallback, Some(PlaceError::GeolocationUnavailable(_))));
    }

    #[test]
    fn test_no_locator_uses_default() {
        let pos = locate_or_default(None, ACCRA);
        assert_eq!(pos.coordinate, ACCRA);
        assert!(pos.fallback.is_some());
    }
}
