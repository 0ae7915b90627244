use clap::{Parser, Subcommand};
use place_finder::places::directions::{directions_url, Platform};
use place_finder::session::{describe, Session};
use place_finder::{
    init_logging, server, Category, CategorySet, Config, Coordinate, PlaceFinder, SearchOutcome, SearchScope,
    ViewState,
};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;

/// Place Finder: cafes, restaurants, attractions, nightclubs and pubs nearby
///
/// Looks up places from OpenStreetMap around a city, an address, a coordinate
/// or your current location.
///
/// Examples:
///   placefinder search Accra
///   placefinder search "Oxford Street, London" --category pub --category nightclub
///   placefinder near 5.6037 -0.187 --cafes
///   placefinder here --radius 1500
///   placefinder directions 5.6037 -0.187 --native
///   placefinder interactive --native
///   placefinder serve --port 8080
#[derive(Parser)]
#[command(name = "placefinder", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only search these categories (repeatable). Defaults to every enabled category.
    #[arg(long = "category", short = 'c', global = true, value_parser = parse_category)]
    categories: Vec<Category>,

    /// Search radius in meters.
    #[arg(long, short = 'r', global = true)]
    radius: Option<u32>,

    /// Search cafes only.
    #[arg(long, global = true)]
    cafes: bool,

    /// Offline mode: geocode from the cache only.
    #[arg(long, global = true)]
    offline: bool,

    /// Config file (defaults to ~/.placefinder/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Find places around a city or address.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Find places around a coordinate.
    Near {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Find places around your current location (IP-based).
    Here,
    /// Resolve a city or address to coordinates.
    Geocode {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Print a driving directions link.
    Directions {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        /// Use the Apple Maps link.
        #[arg(long)]
        native: bool,
        /// Pick the link the way a browser with this User-Agent would get it.
        #[arg(long, conflicts_with = "native")]
        user_agent: Option<String>,
    },
    /// List the categories that can be searched.
    Categories,
    /// Interactive session.
    Interactive {
        /// Use Apple Maps links for directions.
        #[arg(long)]
        native: bool,
        /// Pick the directions link the way a browser with this User-Agent would get it.
        #[arg(long, conflicts_with = "native")]
        user_agent: Option<String>,
    },
    /// Run the JSON HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    }

    fn scope(&self, config: &Config) -> SearchScope {
        if self.cafes {
            SearchScope::Cafes
        } else {
            SearchScope::Categories(self.category_set(config))
        }
    }

    fn category_set(&self, config: &Config) -> CategorySet {
        if self.categories.is_empty() {
            config.categories.clone()
        } else {
            self.categories.iter().copied().collect()
        }
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse().map_err(|e: place_finder::PlaceError| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // ── Commands that need no network ───────────────────────────

    match &cli.command {
        Command::Categories => {
            for category in config.categories.iter() {
                eprintln!("  {:<20} {}", category.as_str(), category.filter_label());
            }
            print_json(&config.categories);
            return;
        }
        Command::Directions { lat, lon, native, user_agent } => {
            let destination = Coordinate::checked(*lat, *lon).unwrap_or_else(|e| fail(&e));
            let platform = platform_for(*native, user_agent.as_deref());
            eprintln!("  {}", platform.button_label());
            println!("{}", directions_url(destination, platform));
            return;
        }
        _ => {}
    }

    let scope = cli.scope(&config);
    let initial_categories = cli.category_set(&config);
    let finder = Arc::new(PlaceFinder::from_config(config, cli.offline));

    match cli.command {
        Command::Search { query } => {
            let query = query.join(" ");
            match finder.search_text(&query, &scope, cli.radius) {
                Ok(Some(outcome)) => report(&outcome),
                Ok(None) => fail_usage(),
                Err(e) => fail(&e),
            }
        }
        Command::Near { lat, lon } => {
            let center = Coordinate::checked(lat, lon).unwrap_or_else(|e| fail(&e));
            match finder.search_near(center, &scope, cli.radius) {
                Ok(outcome) => report(&outcome),
                Err(e) => fail(&e),
            }
        }
        Command::Here => match finder.search_here(&scope, cli.radius) {
            Ok(outcome) => report(&outcome),
            Err(e) => fail(&e),
        },
        Command::Geocode { query } => {
            let query = query.join(" ");
            match finder.geocode(&query) {
                Ok(Some(center)) => {
                    eprintln!("  \u{1F4CD} {}", center);
                    print_json(&serde_json::json!({ "query": query, "lat": center.lat, "lon": center.lon }));
                }
                Ok(None) => fail_usage(),
                Err(e) => fail(&e),
            }
        }
        Command::Interactive { native, user_agent } => {
            let session = Session::new(finder, ViewState::new(initial_categories), io::stdout())
                .with_radius(cli.radius)
                .with_platform(platform_for(native, user_agent.as_deref()));
            if let Err(e) = session.run(BufReader::new(io::stdin())) {
                fail(&e);
            }
        }
        Command::Serve { host, port } => {
            let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
                eprintln!("Error: Cannot start async runtime: {}", e);
                std::process::exit(1);
            });
            if let Err(e) = runtime.block_on(server::start(&host, port, finder)) {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Categories | Command::Directions { .. } => {}
    }
}

fn platform_for(native: bool, user_agent: Option<&str>) -> Platform {
    match (native, user_agent) {
        (true, _) => Platform::AppleMaps,
        (false, Some(ua)) => Platform::from_user_agent(ua),
        (false, None) => Platform::WebMaps,
    }
}

fn load_config(cli: &Cli) -> place_finder::Result<Config> {
    match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(std::env::vars())?;
            config.validated()
        }
        None => Config::load(),
    }
}

/// Human-readable list on stderr, JSON on stdout.
fn report(outcome: &SearchOutcome) {
    eprintln!("  \u{1F4CD} {} (radius {} m)", outcome.center, outcome.radius_m);
    if let Some(notice) = &outcome.notice {
        eprintln!("  \u{26A0}\u{FE0F}  {}", notice);
    }
    eprintln!("  {}", outcome.summary());
    for place in &outcome.places {
        eprintln!("    {}", describe(place));
    }
    print_json(outcome);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn fail(e: &place_finder::PlaceError) -> ! {
    tracing::debug!(error = %e, "command failed");
    eprintln!("Error: {}", e.user_message());
    eprintln!("  ({})", e);
    std::process::exit(1);
}

fn fail_usage() -> ! {
    eprintln!("Error: No location specified.");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  placefinder search Accra");
    eprintln!("  placefinder near 5.6037 -0.187");
    eprintln!("  placefinder here");
    std::process::exit(1);
}
