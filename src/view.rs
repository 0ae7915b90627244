//! View state for an interactive place-finding session.
//!
//! `ViewState` is an immutable record; every change goes through
//! [`ViewState::reduce`]. Each search start bumps a generation counter and
//! outcomes carry the generation they were issued under, so an answer that
//! arrives after a newer search started is dropped instead of overwriting
//! fresher results.

use crate::error::PlaceError;
use crate::places::types::{Category, CategorySet, Coordinate, Place};
use serde::Serialize;

/// Identifies one issued search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

#[derive(Debug)]
pub enum Action {
    /// A new centre was chosen (geocoded, located, or the default).
    SetCenter(Coordinate),
    /// A search in flight resolved its centre. Ignored if the search is stale.
    CenterResolved { generation: Generation, center: Coordinate },
    ToggleCategory(Category),
    SearchStarted,
    ResultsLoaded { generation: Generation, places: Vec<Place> },
    SearchFailed { generation: Generation, error: PlaceError },
    /// A recoverable problem that doesn't end a search, e.g. a geolocation fallback.
    Notice(String),
    Select(String),
    ClearSelection,
    ToggleFilterPanel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    center: Option<Coordinate>,
    places: Vec<Place>,
    selected: Option<String>,
    categories: CategorySet,
    loading: bool,
    error: Option<String>,
    show_filters: bool,
    generation: Generation,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(CategorySet::all())
    }
}

impl ViewState {
    pub fn new(categories: CategorySet) -> Self {
        Self {
            center: None,
            places: Vec::new(),
            selected: None,
            categories,
            loading: false,
            error: None,
            show_filters: true,
            generation: Generation(0),
        }
    }

    pub fn reduce(self, action: Action) -> Self {
        match action {
            Action::SetCenter(center) => Self {
                center: Some(center),
                ..self
            },
            Action::CenterResolved { generation, center } => {
                if generation != self.generation {
                    return self;
                }
                Self {
                    center: Some(center),
                    ..self
                }
            }
            Action::ToggleCategory(category) => {
                let mut categories = self.categories;
                categories.toggle(category);
                Self { categories, ..self }
            }
            Action::SearchStarted => Self {
                loading: true,
                error: None,
                generation: Generation(self.generation.0 + 1),
                ..self
            },
            Action::ResultsLoaded { generation, places } => {
                if generation != self.generation {
                    tracing::debug!(stale = generation.0, current = self.generation.0, "discarding stale results");
                    return self;
                }
                let selected = self
                    .selected
                    .filter(|id| places.iter().any(|p| &p.id == id));
                Self {
                    places,
                    selected,
                    loading: false,
                    ..self
                }
            }
            Action::SearchFailed { generation, error } => {
                if generation != self.generation {
                    tracing::debug!(stale = generation.0, current = self.generation.0, "discarding stale failure");
                    return self;
                }
                tracing::warn!(error = %error, "search failed");
                Self {
                    loading: false,
                    error: Some(error.user_message().to_string()),
                    ..self
                }
            }
            Action::Notice(message) => Self {
                error: Some(message),
                ..self
            },
            Action::Select(id) => {
                if self.places.iter().any(|p| p.id == id) {
                    Self {
                        selected: Some(id),
                        ..self
                    }
                } else {
                    self
                }
            }
            Action::ClearSelection => Self {
                selected: None,
                ..self
            },
            Action::ToggleFilterPanel => Self {
                show_filters: !self.show_filters,
                ..self
            },
        }
    }

    /// Generation of the most recently started search.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether a toggle or centre change should trigger a new search.
    pub fn should_search(&self) -> bool {
        self.center.is_some() && !self.categories.is_empty()
    }

    pub fn center(&self) -> Option<Coordinate> {
        self.center
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Places that can be drawn: those with a coordinate.
    pub fn markers(&self) -> impl Iterator<Item = &Place> {
        self.places.iter().filter(|p| p.is_renderable())
    }

    pub fn selected(&self) -> Option<&Place> {
        let id = self.selected.as_deref()?;
        self.places.iter().find(|p| p.id == id)
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn show_filters(&self) -> bool {
        self.show_filters
    }

    /// "Found N places nearby", only once a search has settled with results.
    pub fn summary(&self) -> Option<String> {
        if self.loading || self.places.is_empty() {
            None
        } else {
            Some(format!("Found {} places nearby", self.places.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::types::ElementKind;

    fn place(id: &str, coordinate: Option<Coordinate>) -> Place {
        Place {
            id: id.into(),
            name: format!("Place {id}"),
            coordinate,
            address: None,
            cuisine: None,
            category: Category::Restaurant,
            kind: ElementKind::Node,
        }
    }

    fn loaded(places: Vec<Place>) -> ViewState {
        let state = ViewState::default().reduce(Action::SearchStarted);
        let generation = state.generation();
        state.reduce(Action::ResultsLoaded { generation, places })
    }

    #[test]
    fn test_results_loaded() {
        let state = loaded(vec![place("1", Some(Coordinate::new(1.0, 1.0)))]);
        assert!(!state.is_loading());
        assert_eq!(state.places().len(), 1);
        assert_eq!(state.summary().as_deref(), Some("Found 1 places nearby"));
    }

    #[test]
    fn test_stale_results_discarded() {
        let state = ViewState::default().reduce(Action::SearchStarted);
        let slow = state.generation();
        let state = state.reduce(Action::SearchStarted);
        let fast = state.generation();

        let state = state.reduce(Action::ResultsLoaded { generation: fast, places: vec![place("new", None)] });
        let state = state.reduce(Action::ResultsLoaded { generation: slow, places: vec![place("old", None)] });

        assert_eq!(state.places()[0].id, "new");
    }

    #[test]
    fn test_stale_failure_discarded() {
        let state = ViewState::default().reduce(Action::SearchStarted);
        let slow = state.generation();
        let state = state.reduce(Action::SearchStarted);
        let state = state.reduce(Action::SearchFailed {
            generation: slow,
            error: PlaceError::SearchFailed("timeout".into()),
        });
        assert!(state.error().is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn test_failure_keeps_prior_places() {
        let state = loaded(vec![place("1", None), place("2", None)]).reduce(Action::SearchStarted);
        let generation = state.generation();
        let state = state.reduce(Action::SearchFailed {
            generation,
            error: PlaceError::LocationNotFound("Nowhereville123".into()),
        });
        assert_eq!(state.places().len(), 2);
        assert_eq!(state.error(), Some("Location not found. Please try another search."));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_search_start_clears_error() {
        let state = ViewState::default().reduce(Action::Notice("oops".into()));
        assert_eq!(state.error(), Some("oops"));
        assert!(state.reduce(Action::SearchStarted).error().is_none());
    }

    #[test]
    fn test_markers_skip_missing_coordinates() {
        let state = loaded(vec![place("1", Some(Coordinate::new(1.0, 2.0))), place("2", None)]);
        let ids: Vec<&str> = state.markers().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn test_select_and_clear() {
        let state = loaded(vec![place("1", None)]).reduce(Action::Select("1".into()));
        assert_eq!(state.selected().map(|p| p.id.as_str()), Some("1"));
        let state = state.reduce(Action::Select("missing".into()));
        assert_eq!(state.selected().map(|p| p.id.as_str()), Some("1"));
        assert!(state.reduce(Action::ClearSelection).selected().is_none());
    }

    #[test]
    fn test_selection_dropped_when_place_disappears() {
        let state = loaded(vec![place("1", None)]).reduce(Action::Select("1".into())).reduce(Action::SearchStarted);
        let generation = state.generation();
        let state = state.reduce(Action::ResultsLoaded { generation, places: vec![place("2", None)] });
        assert!(state.selected().is_none());
    }

    #[test]
    fn test_toggle_and_should_search() {
        let state = ViewState::new(vec![Category::Pub].into());
        assert!(!state.should_search());
        let state = state.reduce(Action::SetCenter(Coordinate::new(0.0, 0.0)));
        assert!(state.should_search());
        let state = state.reduce(Action::ToggleCategory(Category::Pub));
        assert!(state.categories().is_empty());
        assert!(!state.should_search());
    }

    #[test]
    fn test_stale_center_ignored() {
        let state = ViewState::default().reduce(Action::SearchStarted);
        let slow = state.generation();
        let state = state.reduce(Action::SearchStarted);
        let fast = state.generation();
        let state = state
            .reduce(Action::CenterResolved { generation: fast, center: Coordinate::new(1.0, 1.0) })
            .reduce(Action::CenterResolved { generation: slow, center: Coordinate::new(9.0, 9.0) });
        assert_eq!(state.center(), Some(Coordinate::new(1.0, 1.0)));
    }

    #[test]
    fn test_filter_panel_toggle() {
        let state = ViewState::default();
        assert!(state.show_filters());
        assert!(!state.reduce(Action::ToggleFilterPanel).show_filters());
    }
}
