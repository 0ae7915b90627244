//! The PlaceFinder, the primary public API.
//!
//! Geocode or locate → compose query → fetch → classify.

use crate::config::Config;
use crate::error::{PlaceError, Result};
use crate::places::cache::GeocodeCache;
use crate::places::device::{locate_or_default, DeviceLocator, IpLocator};
use crate::places::geocode::{Geocoder, NominatimGeocoder};
use crate::places::overpass::{FeatureSource, OverpassSource};
use crate::places::query::build_query;
use crate::places::resolver::GeocodeResolver;
use crate::places::types::{Coordinate, Place, SearchRequest, SearchScope};
use crate::places::Classifier;
use serde::Serialize;
use std::time::Instant;

/// Places found around a centre.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub center: Coordinate,
    pub radius_m: u32,
    pub places: Vec<Place>,
    /// User-facing note, e.g. that the default centre was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl SearchOutcome {
    pub fn summary(&self) -> String {
        format!("Found {} places nearby", self.places.len())
    }
}

pub struct PlaceFinder {
    config: Config,
    geocoder: Box<dyn Geocoder>,
    source: Box<dyn FeatureSource>,
    locator: Option<Box<dyn DeviceLocator>>,
    classifier: Classifier,
}

impl PlaceFinder {
    pub fn new(config: Config, geocoder: Box<dyn Geocoder>, source: Box<dyn FeatureSource>) -> Self {
        let classifier = Classifier::new(&config.categories);
        Self {
            config,
            geocoder,
            source,
            locator: None,
            classifier,
        }
    }

    pub fn with_locator(mut self, locator: Box<dyn DeviceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Wire up the real network services described by `config`.
    ///
    /// With `offline` set, geocoding answers from the on-disk cache only.
    pub fn from_config(config: Config, offline: bool) -> Self {
        let timeout = config.timeout();
        let nominatim = NominatimGeocoder::new(config.nominatim_url.clone(), &config.user_agent, timeout);
        let cache = GeocodeCache::load_from(config.cache_path(), config.cache_ttl_days);
        let mut resolver = GeocodeResolver::new(Box::new(nominatim), cache);
        resolver.set_offline(offline);

        let overpass = OverpassSource::new(config.overpass_url.clone(), &config.user_agent, timeout);
        let locator = IpLocator::new(config.ip_locate_url.clone(), &config.user_agent, timeout);

        Self::new(config, Box::new(resolver), Box::new(overpass)).with_locator(Box::new(locator))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Geocode free text. Blank input is a no-op and yields `Ok(None)`.
    pub fn geocode(&self, query: &str) -> Result<Option<Coordinate>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        self.geocoder.geocode(query).map(Some)
    }

    /// Build a request around `center`, limited to the enabled categories.
    ///
    /// `radius_m` defaults per scope: the configured place radius, or the cafe radius.
    pub fn request_for(&self, center: Coordinate, scope: &SearchScope, radius_m: Option<u32>) -> SearchRequest {
        let request = match scope {
            SearchScope::Categories(set) => SearchRequest::categories(center, set.restricted_to(&self.config.categories))
                .with_radius(self.config.radius_m),
            SearchScope::Cafes => SearchRequest::cafes(center).with_radius(self.config.cafe_radius_m),
        };
        match radius_m {
            Some(r) => request.with_radius(r),
            None => request,
        }
    }

    /// Run a search. A request for zero feature classes returns no places without a fetch.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<Place>> {
        let start = Instant::now();
        let query = build_query(request, self.config.timeout_secs)?;
        if query.is_empty() {
            tracing::debug!("no categories selected, skipping fetch");
            return Ok(Vec::new());
        }

        let features = self.source.fetch(&query)?;
        let places = self.classifier.classify_all(&features);

        tracing::info!(
            center = %request.center,
            radius_m = request.radius_m,
            places = places.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(places)
    }

    /// Search around `center`.
    pub fn search_near(&self, center: Coordinate, scope: &SearchScope, radius_m: Option<u32>) -> Result<SearchOutcome> {
        let request = self.request_for(center, scope, radius_m);
        let places = self.search(&request)?;
        Ok(SearchOutcome {
            center,
            radius_m: request.radius_m,
            places,
            notice: None,
        })
    }

    /// Geocode `query`, then search around it. Blank input is a no-op.
    pub fn search_text(&self, query: &str, scope: &SearchScope, radius_m: Option<u32>) -> Result<Option<SearchOutcome>> {
        match self.geocode(query)? {
            Some(center) => self.search_near(center, scope, radius_m).map(Some),
            None => Ok(None),
        }
    }

    /// Device position, or the configured default centre with an explanatory notice.
    pub fn here(&self) -> (Coordinate, Option<PlaceError>) {
        let position = locate_or_default(self.locator.as_deref(), self.config.default_center);
        (position.coordinate, position.fallback)
    }

    /// Search around the device, falling back to the default centre.
    pub fn search_here(&self, scope: &SearchScope, radius_m: Option<u32>) -> Result<SearchOutcome> {
        let (center, fallback) = self.here();
        let mut outcome = self.search_near(center, scope, radius_m)?;
        outcome.notice = fallback.map(|e| e.user_message().to_string());
        Ok(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::places::query::OverpassQuery;
    use crate::places::types::{Category, CategorySet, RawFeature};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    pub(crate) struct FakeGeocoder;

    impl Geocoder for FakeGeocoder {
        fn geocode(&self, query: &str) -> Result<Coordinate> {
            match query.to_lowercase().as_str() {
                "accra" => Ok(Coordinate::new(5.6037, -0.187)),
                "down" => Err(PlaceError::LookupFailed("connection refused".into())),
                _ => Err(PlaceError::LocationNotFound(query.to_string())),
            }
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub calls: Arc<AtomicUsize>,
        pub last_query: Arc<Mutex<Option<String>>>,
    }

    impl FeatureSource for FakeSource {
        fn fetch(&self, query: &OverpassQuery) -> Result<Vec<RawFeature>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.as_str().to_string());
            let body = r#"{"elements":[
                {"type":"node","id":1,"lat":5.6,"lon":-0.2,"tags":{"amenity":"cafe","name":"Joe's"}},
                {"type":"way","id":2,"center":{"lat":1,"lon":2},"tags":{"tourism":"museum"}},
                {"type":"node","id":3,"tags":{"amenity":"pub"}}
            ]}"#;
            crate::places::overpass::parse_elements(body)
        }
    }

    pub(crate) fn finder() -> (PlaceFinder, Arc<AtomicUsize>, Arc<Mutex<Option<String>>>) {
        let source = FakeSource::default();
        let calls = Arc::clone(&source.calls);
        let last = Arc::clone(&source.last_query);
        (PlaceFinder::new(Config::default(), Box::new(FakeGeocoder), Box::new(source)), calls, last)
    }

    fn all() -> SearchScope {
        SearchScope::Categories(CategorySet::all())
    }

    #[test]
    fn test_search_text_classifies() {
        let (finder, calls, _) = finder();
        let outcome = finder.search_text("Accra", &all(), None).unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.radius_m, 3000);
        assert_eq!(outcome.places.len(), 3);
        assert_eq!(outcome.places[0].category, Category::Restaurant);
        assert_eq!(outcome.places[1].category, Category::TouristAttraction);
        assert_eq!(outcome.places[1].coordinate, Some(Coordinate::new(1.0, 2.0)));
        assert!(outcome.places[2].coordinate.is_none());
        assert_eq!(outcome.summary(), "Found 3 places nearby");
    }

    #[test]
    fn test_blank_query_is_noop() {
        let (finder, calls, _) = finder();
        assert!(finder.search_text("   ", &all(), None).unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_not_found_propagates() {
        let (finder, calls, _) = finder();
        let err = finder.search_text("Nowhereville123", &all(), None).unwrap_err();
        assert!(matches!(err, PlaceError::LocationNotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_categories_skip_fetch() {
        let (finder, calls, _) = finder();
        let outcome = finder
            .search_near(Coordinate::new(0.0, 0.0), &SearchScope::Categories(CategorySet::empty()), None)
            .unwrap();
        assert!(outcome.places.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cafe_scope_uses_cafe_radius() {
        let (finder, _, last) = finder();
        let outcome = finder.search_near(Coordinate::new(0.0, 0.0), &SearchScope::Cafes, None).unwrap();
        assert_eq!(outcome.radius_m, 2000);
        let query = last.lock().unwrap().clone().unwrap();
        assert!(query.contains("(around:2000,0,0)"));
    }

    #[test]
    fn test_disabled_categories_are_not_queried() {
        let config = Config {
            categories: vec![Category::Restaurant, Category::Attraction].into(),
            ..Config::default()
        };
        let source = FakeSource::default();
        let last = Arc::clone(&source.last_query);
        let finder = PlaceFinder::new(config, Box::new(FakeGeocoder), Box::new(source));
        finder.search_near(Coordinate::new(0.0, 0.0), &all(), Some(100)).unwrap();
        let query = last.lock().unwrap().clone().unwrap();
        assert!(query.contains("\"amenity\"=\"cafe\""));
        assert!(!query.contains("\"amenity\"=\"pub\""));
        assert!(query.contains("(around:100,"));
    }

    #[test]
    fn test_search_here_without_locator_falls_back() {
        let (finder, _, _) = finder();
        let outcome = finder.search_here(&all(), None).unwrap();
        assert_eq!(outcome.center, Config::default().default_center);
        assert!(outcome.notice.unwrap().starts_with("Unable to get your location"));
    }
}
