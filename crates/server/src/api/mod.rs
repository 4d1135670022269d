use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::Html,
    routing::get,
    Json, Router,
};
use query_api::{nation_options, query, region_1_options, region_2_options};
use serde::Deserialize;
use shared::{
    domain::{Nation, RegionSelector, Selection},
    error::ApiError,
    protocol::{RegionOption, SeriesResponse},
};

use crate::{app_state::AppState, config::parse_flag};

const DASHBOARD_PAGE: &str = include_str!("../../static/index.html");

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct SubRegionQuery {
    region_1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    region_1: Option<String>,
    region_2: Option<String>,
    rolling: Option<String>,
}

impl SeriesQuery {
    fn into_selection(self) -> Result<Selection, ApiError> {
        let rolling_average = match self.rolling.as_deref() {
            None => true,
            Some(raw) => parse_flag(raw).ok_or_else(|| ApiError::invalid_flag("rolling", raw))?,
        };

        Ok(Selection {
            region_1: RegionSelector::from(self.region_1),
            region_2: RegionSelector::from(self.region_2),
            rolling_average,
        })
    }
}

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/regions", get(http_region_1_options))
        .route("/api/sub_regions", get(http_region_2_options))
        .route("/api/nations", get(http_nations))
        .route("/api/series", get(http_series))
        .fallback(not_found)
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

async fn healthz() -> &'static str {
    "ok"
}

fn reject(error: ApiError) -> (StatusCode, Json<ApiError>) {
    let status =
        StatusCode::from_u16(error.code.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error))
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiError>) {
    reject(ApiError::unknown_route(uri.path()))
}

async fn http_region_1_options(State(state): State<Arc<AppState>>) -> Json<Vec<RegionOption>> {
    Json(region_1_options(&state.dashboard))
}

async fn http_region_2_options(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SubRegionQuery>,
) -> Json<Vec<RegionOption>> {
    let region_1 = RegionSelector::from(q.region_1);
    Json(region_2_options(&state.dashboard, &region_1))
}

async fn http_nations(State(state): State<Arc<AppState>>) -> Json<Vec<Nation>> {
    Json(nation_options(&state.dashboard))
}

async fn http_series(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SeriesQuery>,
) -> ApiResult<SeriesResponse> {
    let selection = q.into_selection().map_err(reject)?;
    Ok(Json(query(&state.dashboard, &selection)))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
