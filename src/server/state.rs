use crate::finder::PlaceFinder;
use std::sync::Arc;

pub struct AppState {
    pub finder: Arc<PlaceFinder>,
}
