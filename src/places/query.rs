//! Overpass QL composition for nearby-place searches.
//!
//! Each selected category expands to a fixed list of tag selectors, and every
//! selector is emitted once for points (`node`) and once for areas (`way`).
//! The query ends in `out center` so areas come back with a representative
//! point.

use super::types::{Category, Coordinate, SearchRequest, SearchScope};
use crate::error::PlaceError;
use std::fmt;

/// Element types requested for every selector: points, then areas.
const ELEMENT_TYPES: [&str; 2] = ["node", "way"];

/// One `[key]` or `[key=value]` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    pub key: &'static str,
    /// `None` matches any value.
    pub value: Option<&'static str>,
}

const fn eq(key: &'static str, value: &'static str) -> Selector {
    Selector { key, value: Some(value) }
}

const fn any(key: &'static str) -> Selector {
    Selector { key, value: None }
}

const TOURIST_ATTRACTION: &[Selector] = &[
    eq("tourism", "attraction"),
    eq("tourism", "museum"),
    any("historic"),
];
const RESTAURANT: &[Selector] = &[
    eq("amenity", "restaurant"),
    eq("amenity", "cafe"),
    eq("amenity", "bar"),
];
const ATTRACTION: &[Selector] = &[
    eq("leisure", "park"),
    eq("tourism", "viewpoint"),
    eq("amenity", "arts_centre"),
];
const NIGHTCLUB: &[Selector] = &[eq("amenity", "nightclub"), eq("club", "nightclub")];
const PUB: &[Selector] = &[eq("amenity", "pub")];

pub const CAFE_SELECTORS: &[Selector] = &[eq("amenity", "cafe")];

/// Tag selectors that make up a category filter.
///
/// `Attraction` as a filter asks for parks, viewpoints and arts centres; as a
/// classification it is also the catch-all bucket.
pub fn selectors_for(category: Category) -> &'static [Selector] {
    match category {
        Category::TouristAttraction => TOURIST_ATTRACTION,
        Category::Restaurant => RESTAURANT,
        Category::Attraction => ATTRACTION,
        Category::Nightclub => NIGHTCLUB,
        Category::Pub => PUB,
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "[\"{}\"=\"{}\"]", escape_quoted(self.key), escape_quoted(value)),
            None => write!(f, "[\"{}\"]", escape_quoted(self.key)),
        }
    }
}

fn escape_quoted(raw: &str) -> String {
    raw.replace('\\', r"\\").replace('"', "\\\"")
}

/// A composed Overpass QL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassQuery {
    text: String,
    statements: usize,
}

impl OverpassQuery {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of element statements in the union.
    pub fn statement_count(&self) -> usize {
        self.statements
    }

    /// True when the union is empty. Such a query is valid but pointless to send.
    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }
}

impl fmt::Display for OverpassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Build the query for a search request.
///
/// `timeout_secs` becomes the `[timeout:N]` server-side limit.
pub fn build_query(request: &SearchRequest, timeout_secs: u32) -> Result<OverpassQuery, PlaceError> {
    validate(request.center, request.radius_m)?;

    let selectors: Vec<Selector> = match &request.scope {
        SearchScope::Categories(set) => set
            .iter()
            .flat_map(|c| selectors_for(c).iter().copied())
            .collect(),
        SearchScope::Cafes => CAFE_SELECTORS.to_vec(),
    };

    let around = format!("(around:{},{})", request.radius_m, request.center);
    let mut lines = Vec::with_capacity(selectors.len() * ELEMENT_TYPES.len());
    for selector in &selectors {
        for element_type in ELEMENT_TYPES {
            lines.push(format!("  {element_type}{selector}{around};"));
        }
    }

    let body = if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    };
    let text = format!(
        "[out:json][timeout:{}];\n(\n{body});\nout center;",
        timeout_secs.max(1)
    );

    tracing::debug!(statements = lines.len(), radius_m = request.radius_m, "composed overpass query");

    Ok(OverpassQuery {
        text,
        statements: lines.len(),
    })
}

fn validate(center: Coordinate, radius_m: u32) -> Result<(), PlaceError> {
    if radius_m == 0 {
        return Err(PlaceError::InvalidInput("search radius must be a positive number of meters".into()));
    }
    if !center.lat.is_finite() || !center.lon.is_finite() {
        return Err(PlaceError::InvalidInput("search center must be finite".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::types::CategorySet;

    const ACCRA: Coordinate = Coordinate::new(5.6037, -0.187);

    fn query_for(categories: &[Category]) -> OverpassQuery {
        let set: CategorySet = categories.to_vec().into();
        build_query(&SearchRequest::categories(ACCRA, set), 25).unwrap()
    }

    #[test]
    fn test_empty_category_set_requests_nothing() {
        let query = query_for(&[]);
        assert!(query.is_empty());
        assert_eq!(query.as_str(), "[out:json][timeout:25];\n(\n);\nout center;");
        assert!(!query.as_str().contains("node"));
    }

    #[test]
    fn test_pub_query_has_point_and_area() {
        let query = query_for(&[Category::Pub]);
        assert_eq!(
            query.as_str(),
            "[out:json][timeout:25];\n(\n  node[\"amenity\"=\"pub\"](around:3000,5.6037,-0.187);\n  way[\"amenity\"=\"pub\"](around:3000,5.6037,-0.187);\n);\nout center;"
        );
        assert_eq!(query.statement_count(), 2);
    }

    #[test]
    fn test_historic_matches_any_value() {
        let query = query_for(&[Category::TouristAttraction]);
        assert!(query.as_str().contains("node[\"historic\"](around:3000,5.6037,-0.187);"));
        assert!(query.as_str().contains("way[\"historic\"](around:3000,5.6037,-0.187);"));
        assert!(query.as_str().contains("way[\"tourism\"=\"museum\"]"));
    }

    #[test]
    fn test_attraction_filter_predicates() {
        let query = query_for(&[Category::Attraction]);
        for needle in ["[\"leisure\"=\"park\"]", "[\"tourism\"=\"viewpoint\"]", "[\"amenity\"=\"arts_centre\"]"] {
            assert!(query.as_str().contains(&format!("node{needle}")));
            assert!(query.as_str().contains(&format!("way{needle}")));
        }
        assert_eq!(query.statement_count(), 6);
    }

    #[test]
    fn test_all_categories_statement_count() {
        // 3 + 3 + 3 + 2 + 1 selectors, each as node and way
        assert_eq!(query_for(&Category::ALL).statement_count(), 24);
    }

    #[test]
    fn test_ends_with_out_center() {
        assert!(query_for(&[Category::Nightclub]).as_str().ends_with("out center;"));
    }

    #[test]
    fn test_cafe_scope() {
        let query = build_query(&SearchRequest::cafes(ACCRA), 25).unwrap();
        assert_eq!(query.statement_count(), 2);
        assert!(query.as_str().contains("node[\"amenity\"=\"cafe\"](around:2000,5.6037,-0.187);"));
        assert!(!query.as_str().contains("restaurant"));
    }

    #[test]
    fn test_custom_radius() {
        let request = SearchRequest::categories(ACCRA, vec![Category::Pub].into()).with_radius(500);
        let query = build_query(&request, 10).unwrap();
        assert!(query.as_str().starts_with("[out:json][timeout:10];"));
        assert!(query.as_str().contains("(around:500,"));
    }

    #[test]
    fn test_zero_radius_rejected() {
        let request = SearchRequest::cafes(ACCRA).with_radius(0);
        assert!(matches!(build_query(&request, 25), Err(PlaceError::InvalidInput(_))));
    }

    #[test]
    fn test_selector_escaping() {
        let selector = Selector { key: "name", value: Some("coffee \"bar\"") };
        assert_eq!(selector.to_string(), "[\"name\"=\"coffee \\\"bar\\\"\"]");
    }
}
