//! Place Finder: cafes, restaurants, tourist attractions, nightclubs and pubs
//! near any point, from OpenStreetMap data.
//!
//! ```no_run
//! use place_finder::{Config, PlaceFinder, SearchScope, CategorySet};
//!
//! let finder = PlaceFinder::from_config(Config::load()?, false);
//! if let Some(outcome) = finder.search_text("Accra", &SearchScope::Categories(CategorySet::all()), None)? {
//!     println!("{}", outcome.summary());
//! }
//! # Ok::<(), place_finder::PlaceError>(())
//! ```

pub mod config;
pub mod error;
pub mod finder;
pub mod places;
pub mod server;
pub mod session;
pub mod view;

pub use config::Config;
pub use error::{PlaceError, Result};
pub use finder::{PlaceFinder, SearchOutcome};
pub use places::{Category, CategorySet, Coordinate, Place, Platform, SearchRequest, SearchScope};
pub use view::{Action, ViewState};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `level`. Calling this more than once is harmless.
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level.into().to_string())?
            .add_directive("hyper=warn".parse()?)
            .add_directive("rustls=warn".parse()?),
    };

    // Err here only means a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
