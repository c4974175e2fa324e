use std::any::Any;

use axum::Router;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::app::model::{SearchQuery, SearchRequest, ValidatedSearch};
use crate::app::state::AppState;
use crate::detail::DetailRequest;
use crate::error::ApiError;
use crate::formats::{DetailResponse, SearchResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/search", get(search_get).post(search_post))
        .route("/api/detail", get(detail_get).post(detail_post))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(message) = &self {
            tracing::error!(error = %message, "request failed");
        }
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

fn panic_response(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("handler panicked");
    ApiError::Internal("Internal server error".to_owned()).into_response()
}

async fn search_get(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query.map_err(|err| ApiError::client_input(err.body_text()))?;
    let search = query.validate(&state.registry)?;
    Ok(Json(run_search(&state, search).await))
}

async fn search_post(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = body.map_err(|err| ApiError::client_input(err.body_text()))?;
    let search = request.validate(&state.registry)?;
    Ok(Json(run_search(&state, search).await))
}

async fn run_search(state: &AppState, search: ValidatedSearch) -> SearchResponse {
    state
        .aggregator
        .search(&search.query, &search.sources, search.page)
        .await
}

async fn detail_get(
    State(state): State<AppState>,
    request: Result<Query<DetailRequest>, QueryRejection>,
) -> Result<Json<DetailResponse>, ApiError> {
    let Query(request) = request.map_err(|err| ApiError::client_input(err.body_text()))?;
    fetch_detail(&state, request).await
}

async fn detail_post(
    State(state): State<AppState>,
    body: Result<Json<DetailRequest>, JsonRejection>,
) -> Result<Json<DetailResponse>, ApiError> {
    let Json(request) = body.map_err(|err| ApiError::client_input(err.body_text()))?;
    fetch_detail(&state, request).await
}

async fn fetch_detail(
    state: &AppState,
    request: DetailRequest,
) -> Result<Json<DetailResponse>, ApiError> {
    let data = state.detail.fetch(&request).await?;
    Ok(Json(DetailResponse {
        success: true,
        data,
    }))
}
