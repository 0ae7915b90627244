//! Turns raw tagged elements into display-ready places.
//!
//! Category assignment walks [`RULES`] top to bottom and stops at the first
//! rule with a matching tag. Tourism and historic tags outrank amenity tags,
//! so a historic pub is a tourist attraction. Anything unmatched lands in
//! [`Category::Attraction`].

use super::types::{Category, CategorySet, Place, RawFeature};

pub const UNNAMED_PLACE: &str = "Unnamed Place";

/// Category every unmatched element falls back to.
pub const FALLBACK_CATEGORY: Category = Category::Attraction;

#[derive(Debug, Clone, Copy)]
enum TagMatch {
    Equals(&'static str, &'static str),
    /// Key present with any value.
    Present(&'static str),
}

impl TagMatch {
    fn matches(self, feature: &RawFeature) -> bool {
        match self {
            Self::Equals(key, value) => feature.tag(key) == Some(value),
            Self::Present(key) => feature.has_tag(key),
        }
    }
}

struct Rule {
    category: Category,
    any_of: &'static [TagMatch],
}

const RULES: &[Rule] = &[
    Rule {
        category: Category::TouristAttraction,
        any_of: &[
            TagMatch::Equals("tourism", "attraction"),
            TagMatch::Equals("tourism", "museum"),
            TagMatch::Present("historic"),
        ],
    },
    Rule {
        category: Category::Restaurant,
        any_of: &[
            TagMatch::Equals("amenity", "restaurant"),
            TagMatch::Equals("amenity", "cafe"),
            TagMatch::Equals("amenity", "bar"),
        ],
    },
    Rule {
        category: Category::Nightclub,
        any_of: &[
            TagMatch::Equals("amenity", "nightclub"),
            TagMatch::Equals("club", "nightclub"),
        ],
    },
    Rule {
        category: Category::Pub,
        any_of: &[TagMatch::Equals("amenity", "pub")],
    },
];

/// Classifier bound to the set of categories the product ships with.
///
/// A rule whose category is disabled is skipped, so e.g. a build without
/// pubs files `amenity=pub` under the fallback bucket.
#[derive(Debug, Clone)]
pub struct Classifier {
    enabled: CategorySet,
}

impl Default for Classifier {
    fn default() -> Self {
        Self { enabled: CategorySet::all() }
    }
}

impl Classifier {
    pub fn new(enabled: &CategorySet) -> Self {
        let mut enabled = enabled.clone();
        enabled.insert(FALLBACK_CATEGORY);
        Self { enabled }
    }

    pub fn category_of(&self, feature: &RawFeature) -> Category {
        RULES
            .iter()
            .filter(|rule| self.enabled.contains(rule.category))
            .find(|rule| rule.any_of.iter().any(|m| m.matches(feature)))
            .map_or(FALLBACK_CATEGORY, |rule| rule.category)
    }

    pub fn classify(&self, feature: &RawFeature) -> Place {
        Place {
            id: feature.id.to_string(),
            name: display_name(feature),
            coordinate: feature.coordinate(),
            address: address(feature),
            cuisine: feature.tag("cuisine").map(str::to_string),
            category: self.category_of(feature),
            kind: feature.kind,
        }
    }

    pub fn classify_all<'a, I>(&self, features: I) -> Vec<Place>
    where
        I: IntoIterator<Item = &'a RawFeature>,
    {
        features.into_iter().map(|f| self.classify(f)).collect()
    }
}

/// Classify with every category enabled.
pub fn classify(feature: &RawFeature) -> Place {
    Classifier::default().classify(feature)
}

fn display_name(feature: &RawFeature) -> String {
    feature
        .tag("name")
        .filter(|name| !name.is_empty())
        .unwrap_or(UNNAMED_PLACE)
        .to_string()
}

/// `"{housenumber} {street}"`, trimmed. No street means no address at all.
fn address(feature: &RawFeature) -> Option<String> {
    let street = feature.tag("addr:street").filter(|s| !s.is_empty())?;
    let number = feature.tag("addr:housenumber").unwrap_or("");
    let composed = format!("{} {}", number, street).trim().to_string();
    if composed.is_empty() { None } else { Some(composed) }
}
