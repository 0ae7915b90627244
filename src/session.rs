//! Interactive terminal session.
//!
//! Input lines and search outcomes arrive on one channel. Searches run on
//! worker threads and report back tagged with the generation they were
//! started under, so typing a new search while an old one is still running
//! never lets the old answer win.

use crate::error::{PlaceError, Result};
use crate::finder::PlaceFinder;
use crate::places::directions::{place_directions, Platform};
use crate::places::types::{Category, Coordinate, Place, SearchScope};
use crate::view::{Action, Generation, ViewState};
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

const HELP: &str = "\
Commands:
  search <place>       find places around a city or address
  here                 find places around your current location
  near <lat> <lon>     find places around a coordinate
  toggle <category>    add or remove a category filter
  filters              show or hide the category filters
  list                 list the current results
  select <n>           show details for result n
  directions           directions link for the selected place
  close                clear the selection
  quit";

enum Event {
    Line(String),
    InputClosed,
    Located {
        generation: Generation,
        center: Coordinate,
        notice: Option<String>,
    },
    Finished {
        generation: Generation,
        result: std::result::Result<Vec<Place>, PlaceError>,
    },
}

enum Target {
    Text(String),
    Here,
    Around(Coordinate),
}

#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Session<W: Write> {
    finder: Arc<PlaceFinder>,
    state: ViewState,
    radius_m: Option<u32>,
    platform: Platform,
    out: W,
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl<W: Write> Session<W> {
    pub fn new(finder: Arc<PlaceFinder>, state: ViewState, out: W) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            finder,
            state,
            radius_m: None,
            platform: Platform::WebMaps,
            out,
            tx,
            rx,
        }
    }

    pub fn with_radius(mut self, radius_m: Option<u32>) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Process input until `quit`, or until input ends and no search is pending.
    pub fn run<R: BufRead + Send + 'static>(mut self, input: R) -> Result<ViewState> {
        let tx = self.tx.clone();
        thread::spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                if tx.send(Event::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(Event::InputClosed);
        });

        writeln!(self.out, "Type 'help' for commands.")?;
        let mut input_open = true;
        while input_open || self.state.is_loading() {
            let Ok(event) = self.rx.recv() else { break };
            match event {
                Event::Line(line) => {
                    if self.handle_line(&line)? == Flow::Quit {
                        break;
                    }
                }
                Event::InputClosed => input_open = false,
                outcome => self.handle_outcome(outcome)?,
            }
        }
        Ok(self.state)
    }

    /// Fold a worker report into the state. Only the current search renders.
    fn handle_outcome(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Located { generation, center, notice } => {
                let current = generation == self.state.generation();
                self.dispatch(Action::CenterResolved { generation, center });
                if let (true, Some(message)) = (current, notice) {
                    self.dispatch(Action::Notice(message));
                }
            }
            Event::Finished { generation, result } => {
                let current = generation == self.state.generation();
                match result {
                    Ok(places) => self.dispatch(Action::ResultsLoaded { generation, places }),
                    Err(error) => self.dispatch(Action::SearchFailed { generation, error }),
                }
                if current {
                    self.render_outcome()?;
                }
            }
            Event::Line(_) | Event::InputClosed => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) {
        self.state = std::mem::take(&mut self.state).reduce(action);
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => {}
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "?" => writeln!(self.out, "{}", HELP)?,
            "search" | "s" => {
                if !rest.is_empty() {
                    self.start_search(Target::Text(rest.to_string()))?;
                }
            }
            "here" => self.start_search(Target::Here)?,
            "near" => match parse_coordinate(rest) {
                Ok(center) => self.start_search(Target::Around(center))?,
                Err(e) => writeln!(self.out, "{}", e)?,
            },
            "toggle" => match rest.parse::<Category>() {
                Ok(category) => {
                    self.dispatch(Action::ToggleCategory(category));
                    self.render_filters()?;
                    if let (true, Some(center)) = (self.state.should_search(), self.state.center()) {
                        self.start_search(Target::Around(center))?;
                    }
                }
                Err(e) => writeln!(self.out, "{}", e)?,
            },
            "filters" => {
                self.dispatch(Action::ToggleFilterPanel);
                if self.state.show_filters() {
                    self.render_filters()?;
                } else {
                    writeln!(self.out, "Filters hidden.")?;
                }
            }
            "list" | "ls" => self.render_list()?,
            "select" => {
                let picked = rest
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| self.state.places().get(i))
                    .map(|p| p.id.clone());
                match picked {
                    Some(id) => {
                        self.dispatch(Action::Select(id));
                        self.render_selected()?;
                    }
                    None => writeln!(self.out, "No such place. Use 'list' to see results.")?,
                }
            }
            "directions" | "dir" => match self.state.selected() {
                Some(place) => match place_directions(place, self.platform) {
                    Some(url) => writeln!(self.out, "{}: {}", self.platform.button_label(), url)?,
                    None => writeln!(self.out, "This place has no location to navigate to.")?,
                },
                None => writeln!(self.out, "Select a place first.")?,
            },
            "close" => self.dispatch(Action::ClearSelection),
            other => writeln!(self.out, "Unknown command '{}'. Type 'help'.", other)?,
        }
        Ok(Flow::Continue)
    }

    fn start_search(&mut self, target: Target) -> Result<()> {
        if self.state.categories().is_empty() {
            if let Target::Around(center) = target {
                self.dispatch(Action::SetCenter(center));
            }
            writeln!(self.out, "Select at least one category to search.")?;
            return Ok(());
        }

        self.dispatch(Action::SearchStarted);
        writeln!(self.out, "Searching for places...")?;

        let generation = self.state.generation();
        // A known centre is recorded now so a toggle before the results arrive can re-search.
        if let Target::Around(center) = target {
            self.dispatch(Action::CenterResolved { generation, center });
        }
        let scope = SearchScope::Categories(self.state.categories().clone());
        let radius_m = self.radius_m;
        let finder = Arc::clone(&self.finder);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let (center, notice) = match target {
                Target::Around(center) => (center, None),
                Target::Here => {
                    let (center, fallback) = finder.here();
                    (center, fallback.map(|e| e.user_message().to_string()))
                }
                Target::Text(query) => match finder.geocode(&query) {
                    Ok(Some(center)) => (center, None),
                    Ok(None) => {
                        let _ = tx.send(Event::Finished { generation, result: Ok(Vec::new()) });
                        return;
                    }
                    Err(error) => {
                        let _ = tx.send(Event::Finished { generation, result: Err(error) });
                        return;
                    }
                },
            };
            let _ = tx.send(Event::Located { generation, center, notice });
            let result = finder.search_near(center, &scope, radius_m).map(|o| o.places);
            let _ = tx.send(Event::Finished { generation, result });
        });
        Ok(())
    }

    fn render_outcome(&mut self) -> Result<()> {
        if let Some(error) = self.state.error() {
            writeln!(self.out, "{}", error)?;
        }
        match self.state.summary() {
            Some(summary) => {
                writeln!(self.out, "{}", summary)?;
                self.render_list()?;
            }
            None if self.state.error().is_none() => writeln!(self.out, "No places found nearby.")?,
            None => {}
        }
        Ok(())
    }

    fn render_filters(&mut self) -> Result<()> {
        let selected = self.state.categories().clone();
        for category in self.finder.config().categories.iter() {
            let mark = if selected.contains(category) { "x" } else { " " };
            writeln!(self.out, "  [{}] {:<14} ({})", mark, category.filter_label(), category)?;
        }
        Ok(())
    }

    fn render_list(&mut self) -> Result<()> {
        let lines: Vec<String> = self
            .state
            .places()
            .iter()
            .enumerate()
            .map(|(i, p)| format!("  {:>3}. {}", i + 1, describe(p)))
            .collect();
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn render_selected(&mut self) -> Result<()> {
        let Some(place) = self.state.selected().cloned() else {
            return Ok(());
        };
        writeln!(self.out, "{}", place.name)?;
        if let Some(address) = &place.address {
            writeln!(self.out, "  {}", address)?;
        }
        writeln!(self.out, "  {}", place.category.label())?;
        if let Some(cuisine) = &place.cuisine {
            writeln!(self.out, "  Cuisine: {}", cuisine)?;
        }
        Ok(())
    }
}

/// One-line description used in result lists.
pub fn describe(place: &Place) -> String {
    let mut line = format!("[{}] {}", place.category.label(), place.name);
    if let Some(address) = &place.address {
        line.push_str(&format!(", {}", address));
    }
    if let Some(cuisine) = &place.cuisine {
        line.push_str(&format!(" ({})", cuisine));
    }
    if place.coordinate.is_none() {
        line.push_str(" [no location]");
    }
    line
}

fn parse_coordinate(s: &str) -> Result<Coordinate> {
    let parts: Vec<&str> = s.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty()).collect();
    let [lat, lon] = parts.as_slice() else {
        return Err(PlaceError::InvalidInput("usage: near <lat> <lon>".into()));
    };
    let lat: f64 = lat.parse().map_err(|_| PlaceError::InvalidInput(format!("bad latitude '{}'", lat)))?;
    let lon: f64 = lon.parse().map_err(|_| PlaceError::InvalidInput(format!("bad longitude '{}'", lon)))?;
    Coordinate::checked(lat, lon)
}
