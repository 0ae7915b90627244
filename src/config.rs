//! Runtime configuration.
//!
//! Layering: built-in defaults, then `~/.placefinder/config.json` if it
//! exists, then `PLACEFINDER_*` environment variables. The CLI applies its
//! own flags on top.

use crate::error::{PlaceError, Result};
use crate::places::cache::{GeocodeCache, DEFAULT_TTL_DAYS};
use crate::places::types::{Category, CategorySet, Coordinate, CAFE_RADIUS_M, DEFAULT_RADIUS_M};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "PLACEFINDER_";

/// Accra. Used when the device cannot be located.
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(5.6037, -0.187);

/// `~/.placefinder`, or `./.placefinder` when there is no home directory.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".placefinder")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub nominatim_url: String,
    pub overpass_url: String,
    pub ip_locate_url: String,
    pub user_agent: String,
    /// HTTP timeout, also sent to Overpass as its server-side limit.
    pub timeout_secs: u32,
    pub radius_m: u32,
    pub cafe_radius_m: u32,
    pub default_center: Coordinate,
    /// Categories this build offers. `attraction` is always kept.
    pub categories: CategorySet,
    pub cache_ttl_days: u32,
    pub cache_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org/search".into(),
            overpass_url: "https://overpass-api.de/api/interpreter".into(),
            ip_locate_url: "https://ipapi.co/json/".into(),
            user_agent: concat!("PlaceFinder/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 25,
            radius_m: DEFAULT_RADIUS_M,
            cafe_radius_m: CAFE_RADIUS_M,
            default_center: DEFAULT_CENTER,
            categories: CategorySet::all(),
            cache_ttl_days: DEFAULT_TTL_DAYS,
            cache_path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Defaults, then the config file if present, then the process environment.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::read_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(std::env::vars())?;
        config.validated()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::read_file(path)?.validated()
    }

    fn read_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| PlaceError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply `PLACEFINDER_*` overrides. Unknown variables are ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "NOMINATIM_URL" => self.nominatim_url = value,
                "OVERPASS_URL" => self.overpass_url = value,
                "IP_LOCATE_URL" => self.ip_locate_url = value,
                "USER_AGENT" => self.user_agent = value,
                "TIMEOUT_SECS" => self.timeout_secs = parse_number(&key, &value)?,
                "RADIUS_M" => self.radius_m = parse_number(&key, &value)?,
                "CAFE_RADIUS_M" => self.cafe_radius_m = parse_number(&key, &value)?,
                "CACHE_TTL_DAYS" => self.cache_ttl_days = parse_number(&key, &value)?,
                "CACHE_PATH" => self.cache_path = Some(PathBuf::from(value)),
                "CATEGORIES" => {
                    self.categories = CategorySet::parse_list(&value)
                        .map_err(|e| PlaceError::Config(format!("{}: {}", key, e)))?;
                }
                _ => tracing::debug!(variable = %key, "ignoring unknown setting"),
            }
        }
        Ok(())
    }

    /// Check ranges and make sure the fallback category is offered.
    pub fn validated(mut self) -> Result<Self> {
        if self.radius_m == 0 || self.cafe_radius_m == 0 {
            return Err(PlaceError::Config("search radius must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(PlaceError::Config("timeout_secs must be positive".into()));
        }
        let center = self.default_center;
        Coordinate::checked(center.lat, center.lon)
            .map_err(|e| PlaceError::Config(format!("default_center: {}", e)))?;
        if !self.categories.contains(Category::Attraction) {
            tracing::warn!("'attraction' is the fallback category and cannot be disabled; enabling it");
            self.categories.insert(Category::Attraction);
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_secs))
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(GeocodeCache::default_path)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|e| PlaceError::Config(format!("{}='{}': {}", key, value, e)))
}
