//! Place search subsystem.
//!
//! Geocoding, Overpass query composition and transport, classification of
//! tagged elements into place categories, and directions links.

pub mod cache;
pub mod classify;
pub mod device;
pub mod directions;
pub mod geocode;
pub mod overpass;
pub mod query;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify, Classifier, UNNAMED_PLACE};
pub use device::{locate_or_default, DeviceLocator, DevicePosition, IpLocator};
pub use directions::{directions_url, place_directions, Platform};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use overpass::{FeatureSource, OverpassSource};
pub use query::{build_query, OverpassQuery};
pub use resolver::GeocodeResolver;
pub use types::{
    Category, CategorySet, Coordinate, ElementKind, Place, RawFeature, SearchRequest, SearchScope,
};
