//! Deep links that hand a destination to an external maps application.

use super::types::{Coordinate, Place};
use serde::{Deserialize, Serialize};

/// Whether the client has a first-party native maps app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    AppleMaps,
    WebMaps,
}

impl Platform {
    /// iPhone, iPad and iPod user agents get Apple Maps; everything else gets the web.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if ["iphone", "ipad", "ipod"].iter().any(|d| ua.contains(d)) {
            Self::AppleMaps
        } else {
            Self::WebMaps
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Self::AppleMaps => "Open in Apple Maps",
            Self::WebMaps => "Get Directions",
        }
    }
}

/// Driving directions link to `destination`.
pub fn directions_url(destination: Coordinate, platform: Platform) -> String {
    match platform {
        Platform::AppleMaps => format!(
            "http://maps.apple.com/?daddr={},{}&dirflg=d",
            destination.lat, destination.lon
        ),
        Platform::WebMaps => format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            destination.lat, destination.lon
        ),
    }
}

/// Link for a place, or `None` if the place has no coordinate to navigate to.
pub fn place_directions(place: &Place, platform: Platform) -> Option<String> {
    place.coordinate.map(|c| directions_url(c, platform))
}
