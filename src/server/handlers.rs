use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::error::PlaceError;
use crate::finder::{PlaceFinder, SearchOutcome};
use crate::places::directions::{directions_url, Platform};
use crate::places::types::{Category, CategorySet, Coordinate, SearchScope};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    message: String,
    code: u16,
}

pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.error,
            message: self.message,
            code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PlaceError> for ApiError {
    fn from(e: PlaceError) -> Self {
        let status = match &e {
            PlaceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PlaceError::LocationNotFound(_) => StatusCode::NOT_FOUND,
            PlaceError::LookupFailed(_) | PlaceError::SearchFailed(_) => StatusCode::BAD_GATEWAY,
            PlaceError::GeolocationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PlaceError::Config(_) | PlaceError::Io(_) | PlaceError::InitLogging(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            error: e.to_string(),
            message: e.user_message().to_string(),
        }
    }
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    PlaceError::InvalidInput(msg.into()).into()
}

/// Run blocking finder work off the async executor.
async fn blocking<T, F>(finder: &Arc<PlaceFinder>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&PlaceFinder) -> Result<T, PlaceError> + Send + 'static,
{
    let finder = Arc::clone(finder);
    tokio::task::spawn_blocking(move || f(&finder))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: format!("worker failed: {}", e),
            message: "Something went wrong. Please try again.".into(),
        })?
        .map_err(ApiError::from)
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ─── GET /api/categories ─────────────────────────────────────────

#[derive(Serialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub label: &'static str,
    pub filter_label: &'static str,
}

pub async fn categories(State(state): State<Arc<AppState>>) -> Json<Vec<CategoryInfo>> {
    let infos = state
        .finder
        .config()
        .categories
        .iter()
        .map(|c| CategoryInfo {
            id: c,
            label: c.label(),
            filter_label: c.filter_label(),
        })
        .collect();
    Json(infos)
}

// ─── GET /api/geocode ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GeocodeQuery {
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct GeocodeResponse {
    pub query: String,
    pub lat: f64,
    pub lon: f64,
}

pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>, ApiError> {
    let query = params.query.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return Err(bad_request("Missing 'query' parameter"));
    }

    let q = query.clone();
    let found = blocking(&state.finder, move |finder| finder.geocode(&q)).await?;
    let coordinate = found.ok_or_else(|| bad_request("Missing 'query' parameter"))?;

    Ok(Json(GeocodeResponse {
        query,
        lat: coordinate.lat,
        lon: coordinate.lon,
    }))
}

// ─── GET /api/places and /api/search ─────────────────────────────

#[derive(Serialize)]
pub struct PlacesResponse {
    #[serde(flatten)]
    pub outcome: SearchOutcome,
    pub summary: String,
}

impl From<SearchOutcome> for PlacesResponse {
    fn from(outcome: SearchOutcome) -> Self {
        let summary = outcome.summary();
        Self { outcome, summary }
    }
}

/// `categories` absent means all of them; present but blank means none.
fn parse_scope(categories: Option<&str>, cafes: bool) -> Result<SearchScope, ApiError> {
    if cafes {
        return Ok(SearchScope::Cafes);
    }
    let set = match categories {
        Some(list) => CategorySet::parse_list(list)?,
        None => CategorySet::all(),
    };
    Ok(SearchScope::Categories(set))
}

#[derive(Deserialize)]
pub struct PlacesQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius: Option<u32>,
    pub categories: Option<String>,
    #[serde(default)]
    pub cafes: bool,
}

pub async fn places(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlacesQuery>,
) -> Result<Json<PlacesResponse>, ApiError> {
    let start = Instant::now();

    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return Err(bad_request("Provide 'lat' and 'lon' parameters"));
    };
    let center = Coordinate::checked(lat, lon)?;
    let scope = parse_scope(params.categories.as_deref(), params.cafes)?;
    let radius = params.radius;

    let outcome = blocking(&state.finder, move |finder| finder.search_near(center, &scope, radius)).await?;

    tracing::info!(
        %center,
        places = outcome.places.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "GET /api/places"
    );
    Ok(Json(outcome.into()))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub radius: Option<u32>,
    pub categories: Option<String>,
    #[serde(default)]
    pub cafes: bool,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<PlacesResponse>, ApiError> {
    let start = Instant::now();

    let query = params.query.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return Err(bad_request("Missing 'query' parameter"));
    }
    let scope = parse_scope(params.categories.as_deref(), params.cafes)?;
    let radius = params.radius;

    let q = query.clone();
    let outcome = blocking(&state.finder, move |finder| finder.search_text(&q, &scope, radius))
        .await?
        .ok_or_else(|| bad_request("Missing 'query' parameter"))?;

    tracing::info!(
        query = %query,
        places = outcome.places.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "GET /api/search"
    );
    Ok(Json(outcome.into()))
}

// ─── GET /api/directions ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct DirectionsQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Overrides User-Agent detection.
    pub platform: Option<Platform>,
}

#[derive(Serialize)]
pub struct DirectionsResponse {
    pub platform: Platform,
    pub label: &'static str,
    pub url: String,
}

pub async fn directions(
    headers: HeaderMap,
    Query(params): Query<DirectionsQuery>,
) -> Result<Json<DirectionsResponse>, ApiError> {
    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return Err(bad_request("Provide 'lat' and 'lon' parameters"));
    };
    let destination = Coordinate::checked(lat, lon)?;

    let platform = params.platform.unwrap_or_else(|| {
        let ua = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        Platform::from_user_agent(ua)
    });

    Ok(Json(DirectionsResponse {
        platform,
        label: platform.button_label(),
        url: directions_url(destination, platform),
    }))
}
