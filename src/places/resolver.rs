//! Geocode resolver: cache first, then the network geocoder.
//!
//! Offline mode answers from the cache only.

use super::cache::GeocodeCache;
use super::geocode::Geocoder;
use super::types::Coordinate;
use crate::error::PlaceError;
use std::sync::Mutex;

pub struct GeocodeResolver {
    inner: Box<dyn Geocoder>,
    cache: Mutex<GeocodeCache>,
    offline: bool,
}

impl GeocodeResolver {
    pub fn new(inner: Box<dyn Geocoder>, cache: GeocodeCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
            offline: false,
        }
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }
}

impl Geocoder for GeocodeResolver {
    fn geocode(&self, query: &str) -> Result<Coordinate, PlaceError> {
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(query)
        {
            tracing::debug!(query, "geocode cache hit");
            return Ok(hit);
        }

        if self.offline {
            return Err(PlaceError::LookupFailed(format!("'{}' is not cached and offline mode is on", query)));
        }

        let coordinate = self.inner.geocode(query)?;
        self.cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .put(query, coordinate);
        Ok(coordinate)
    }
}
