//! JSON API consumed by the map front-end

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::animation::AnimationFrame;
use crate::model::RouteModel;
use crate::models::LatLng;
use crate::planner::{Endpoints, MapView, RoutePlan, RoutePlanner, RouteRequest, RouteSelection};
use crate::render::{self, MapOverlay, RouteCard, WeatherPanel};
use crate::safety::WeatherAnalysis;
use crate::scoring::{ScoredRoute, ScoringStrategy};
use crate::{EcoRouteError, VERSION};

/// Shared handler state; the planner serialises use cases behind its lock
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<Mutex<RoutePlanner>>,
    pub model: Arc<RouteModel>,
}

impl AppState {
    pub fn new(planner: RoutePlanner, model: Arc<RouteModel>) -> Self {
        Self {
            planner: Arc::new(Mutex::new(planner)),
            model,
        }
    }
}

/// Error body `{code, error}` with a status derived from the error kind
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self.0.downcast_ref::<EcoRouteError>() {
            Some(e @ EcoRouteError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.user_message())
            }
            Some(e @ EcoRouteError::Api { code, .. }) => {
                warn!("Upstream API error: {e}");
                (StatusCode::BAD_GATEWAY, code.as_str(), e.user_message())
            }
            Some(e) => {
                error!("Request failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.user_message())
            }
            None => {
                error!("Request failed: {:#}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "code": code, "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
pub struct ApiPlan {
    pub best_index: usize,
    pub strategy: ScoringStrategy,
    pub routes: Vec<ScoredRoute>,
    pub cards: Vec<RouteCard>,
    pub overlay: MapOverlay,
    pub weather: WeatherAnalysis,
    pub weather_panel: WeatherPanel,
}

impl From<&RoutePlan> for ApiPlan {
    fn from(plan: &RoutePlan) -> Self {
        Self {
            best_index: plan.best_index,
            strategy: plan.strategy,
            routes: plan.routes.clone(),
            cards: plan.cards(),
            overlay: plan.overlay(),
            weather: plan.weather.clone(),
            weather_panel: plan.weather_panel(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiWeather {
    pub analysis: WeatherAnalysis,
    pub panel: WeatherPanel,
}

#[derive(Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
pub struct InitRequest {
    pub position: Option<LatLng>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/routes", post(plan_routes))
        .route("/routes/best/animation", get(best_animation))
        .route("/routes/{index}/select", post(select_route))
        .route("/weather", get(weather))
        .route("/map-click", post(map_click))
        .route("/init", post(initialize))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .with_state(state)
}

async fn plan_routes(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> ApiResult<ApiPlan> {
    let mut planner = state.planner.lock().await;
    let plan = planner.plan(request).await?;
    Ok(Json(ApiPlan::from(plan)))
}

async fn select_route(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<RouteSelection> {
    let planner = state.planner.lock().await;
    Ok(Json(planner.select_route(index)?))
}

async fn best_animation(State(state): State<AppState>) -> ApiResult<Vec<AnimationFrame>> {
    let planner = state.planner.lock().await;
    Ok(Json(planner.best_animation()?))
}

async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<ApiWeather> {
    let position = LatLng::new(query.lat, query.lon);
    if !position.is_valid() {
        return Err(EcoRouteError::validation(format!(
            "Coordinates out of range: {}, {}",
            query.lat, query.lon
        ))
        .into());
    }

    let planner = state.planner.lock().await;
    let analysis = planner.weather_at(position).await;
    Ok(Json(ApiWeather {
        panel: render::weather_panel(&analysis),
        analysis,
    }))
}

async fn map_click(
    State(state): State<AppState>,
    Json(position): Json<LatLng>,
) -> ApiResult<Endpoints> {
    let mut planner = state.planner.lock().await;
    Ok(Json(planner.map_click(position).await?.clone()))
}

async fn initialize(
    State(state): State<AppState>,
    Json(request): Json<InitRequest>,
) -> ApiResult<MapView> {
    let mut planner = state.planner.lock().await;
    Ok(Json(planner.initialize(request.position).await))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let planner = state.planner.lock().await;
    Ok(Json(ChatResponse {
        reply: planner.chat(&request.message),
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "model_trained": state.model.is_trained(),
    }))
}
