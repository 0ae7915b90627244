//! Core types for the places subsystem.

use crate::error::PlaceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Radius used by the multi-category place search, in meters.
pub const DEFAULT_RADIUS_M: u32 = 3000;
/// Radius used by the cafe-only search, in meters.
pub const CAFE_RADIUS_M: u32 = 2000;

// ─── Coordinate ──────────────────────────────────────────────────

/// WGS84 latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a coordinate from user input, rejecting out-of-range values.
    pub fn checked(lat: f64, lon: f64) -> Result<Self, PlaceError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(PlaceError::InvalidInput("coordinates must be finite numbers".into()));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(PlaceError::InvalidInput(
                "invalid coordinates. Lat: -90..90, Lon: -180..180".into(),
            ));
        }
        Ok(Self { lat, lon })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

// ─── Category ────────────────────────────────────────────────────

/// The closed set of buckets a place can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TouristAttraction,
    Restaurant,
    Attraction,
    Nightclub,
    Pub,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::TouristAttraction,
        Self::Restaurant,
        Self::Attraction,
        Self::Nightclub,
        Self::Pub,
    ];

    /// Stable machine name, as used on the wire and in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TouristAttraction => "tourist_attraction",
            Self::Restaurant => "restaurant",
            Self::Attraction => "attraction",
            Self::Nightclub => "nightclub",
            Self::Pub => "pub",
        }
    }

    /// Label shown on a selected place.
    pub fn label(self) -> &'static str {
        match self {
            Self::TouristAttraction => "Tourist Attraction",
            Self::Restaurant => "Restaurant",
            Self::Attraction => "Attraction",
            Self::Nightclub => "Nightclub",
            Self::Pub => "Pub",
        }
    }

    /// Label shown on the category filter toggle.
    pub fn filter_label(self) -> &'static str {
        match self {
            Self::TouristAttraction => "Tourist Spots",
            Self::Restaurant => "Restaurants",
            Self::Attraction => "Attractions",
            Self::Nightclub => "Nightclubs",
            Self::Pub => "Pubs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PlaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                PlaceError::InvalidInput(format!(
                    "unknown category '{}'. Use one of: tourist_attraction, restaurant, attraction, nightclub, pub",
                    s.trim()
                ))
            })
    }
}

// ─── CategorySet ─────────────────────────────────────────────────

/// An ordered, duplicate-free selection of categories.
///
/// Order is insertion order, so a toggled-on category goes to the end
/// the same way the filter bar appends it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategorySet(Vec<Category>);

impl CategorySet {
    pub fn all() -> Self {
        Self(Category::ALL.to_vec())
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn insert(&mut self, category: Category) {
        if !self.contains(category) {
            self.0.push(category);
        }
    }

    pub fn remove(&mut self, category: Category) {
        self.0.retain(|c| *c != category);
    }

    /// Remove the category if selected, append it otherwise.
    pub fn toggle(&mut self, category: Category) {
        if self.contains(category) {
            self.remove(category);
        } else {
            self.0.push(category);
        }
    }

    /// Keep only categories that are also in `allowed`.
    pub fn restricted_to(&self, allowed: &Self) -> Self {
        Self(self.0.iter().copied().filter(|c| allowed.contains(*c)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    /// Parse a comma-separated list such as `"restaurant,pub"`. Blank input is an empty set.
    pub fn parse_list(s: &str) -> Result<Self, PlaceError> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Category>)
            .collect()
    }
}

impl From<Vec<Category>> for CategorySet {
    fn from(categories: Vec<Category>) -> Self {
        categories.into_iter().collect()
    }
}

impl From<CategorySet> for Vec<Category> {
    fn from(set: CategorySet) -> Self {
        set.0
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = Self::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|c| c.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

// ─── RawFeature ──────────────────────────────────────────────────

/// OSM element kind. Nodes are points; ways and relations are areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    #[default]
    Node,
    Way,
    Relation,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// A tagged element as returned by the feature-search service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(rename = "type", default)]
    pub kind: ElementKind,
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Representative point for areas, present when the query asked for `out center`.
    #[serde(default)]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl RawFeature {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Direct position if present, otherwise the area center.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => self.center.map(|c| Coordinate::new(c.lat, c.lon)),
        }
    }
}

// ─── Place ───────────────────────────────────────────────────────

/// Display-ready place derived from a [`RawFeature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    /// `None` when the element carried neither a position nor a center; such places
    /// cannot be drawn or navigated to.
    pub coordinate: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub kind: ElementKind,
}

impl Place {
    pub fn is_renderable(&self) -> bool {
        self.coordinate.is_some()
    }
}

// ─── SearchRequest ───────────────────────────────────────────────

/// What a search asks the feature service for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    Categories(CategorySet),
    /// The single-predicate `amenity=cafe` search.
    Cafes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub center: Coordinate,
    pub radius_m: u32,
    pub scope: SearchScope,
}

impl SearchRequest {
    pub fn categories(center: Coordinate, categories: CategorySet) -> Self {
        Self {
            center,
            radius_m: DEFAULT_RADIUS_M,
            scope: SearchScope::Categories(categories),
        }
    }

    pub fn cafes(center: Coordinate) -> Self {
        Self {
            center,
            radius_m: CAFE_RADIUS_M,
            scope: SearchScope::Cafes,
        }
    }

    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// True when the request would ask for zero feature classes.
    pub fn is_empty(&self) -> bool {
        matches!(&self.scope, SearchScope::Categories(set) if set.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("pub".parse::<Category>().unwrap(), Category::Pub);
        assert_eq!("Tourist-Attraction".parse::<Category>().unwrap(), Category::TouristAttraction);
        assert!("museum".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_snake_case() {
        let json = serde_json::to_string(&Category::TouristAttraction).unwrap();
        assert_eq!(json, "\"tourist_attraction\"");
    }

    #[test]
    fn test_toggle_removes_then_appends() {
        let mut set = CategorySet::all();
        set.toggle(Category::Restaurant);
        assert!(!set.contains(Category::Restaurant));
        assert_eq!(set.len(), 4);
        set.toggle(Category::Restaurant);
        assert_eq!(set.iter().last(), Some(Category::Restaurant));
    }

    #[test]
    fn test_set_dedupes() {
        let set: CategorySet = vec![Category::Pub, Category::Pub, Category::Nightclub].into();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "pub,nightclub");
    }

    #[test]
    fn test_parse_list() {
        let set = CategorySet::parse_list("restaurant, pub,,").unwrap();
        assert_eq!(set.to_string(), "restaurant,pub");
        assert!(CategorySet::parse_list("").unwrap().is_empty());
        assert!(CategorySet::parse_list("restaurant,bogus").is_err());
    }

    #[test]
    fn test_restricted_to() {
        let allowed: CategorySet = vec![Category::Restaurant, Category::Attraction].into();
        let picked = CategorySet::all().restricted_to(&allowed);
        assert_eq!(picked.to_string(), "restaurant,attraction");
    }

    #[test]
    fn test_checked_coordinate() {
        assert!(Coordinate::checked(5.6, -0.2).is_ok());
        assert!(Coordinate::checked(91.0, 0.0).is_err());
        assert!(Coordinate::checked(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_display() {
        assert_eq!(Coordinate::new(5.6037, -0.187).to_string(), "5.6037,-0.187");
    }

    #[test]
    fn test_feature_coordinate_prefers_direct() {
        let feature = RawFeature {
            lat: Some(1.0),
            lon: Some(2.0),
            center: Some(Center { lat: 3.0, lon: 4.0 }),
            ..Default::default()
        };
        assert_eq!(feature.coordinate(), Some(Coordinate::new(1.0, 2.0)));
    }

    #[test]
    fn test_feature_decodes_unknown_kind() {
        let feature: RawFeature =
            serde_json::from_str(r#"{"type":"area","id":7,"tags":{}}"#).unwrap();
        assert_eq!(feature.kind, ElementKind::Other);
        assert_eq!(feature.coordinate(), None);
    }

    #[test]
    fn test_search_request_defaults() {
        let center = Coordinate::new(0.0, 0.0);
        assert_eq!(SearchRequest::categories(center, CategorySet::all()).radius_m, 3000);
        assert_eq!(SearchRequest::cafes(center).radius_m, 2000);
        assert!(SearchRequest::categories(center, CategorySet::empty()).is_empty());
        assert!(!SearchRequest::cafes(center).is_empty());
    }
}
