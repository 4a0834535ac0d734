use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use crate::AppState;
use flood_assessment::{
    emergency_assistance, fallback_assessment, nearest_river, AssessmentError, AssessmentRequest,
    EmergencyAssistance, PointMatch, RiskAssessment, SeededRandom,
};
use geo_index::{Category, NamedPoint};
use risk_scoring::Language;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error rendered as `{"error": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<AssessmentError> for ApiError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::InvalidInput(reason) => Self::bad_request(reason),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// `?lat=..&lon=..&lang=..` for point lookups
#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub lang: Option<Language>,
}

impl PointQuery {
    fn into_request(self) -> AssessmentRequest {
        AssessmentRequest {
            lat: self.lat,
            lon: self.lon,
            district: None,
            lang: self.lang,
        }
    }
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub category: Category,
    pub count: usize,
    pub points: Vec<NamedPoint>,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/flood-risk", post(assess_flood_risk))
        .route("/rivers/nearest", get(get_nearest_river))
        .route("/emergency/nearest", get(get_emergency_assistance))
        .route("/catalog/:category", get(list_catalog))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Tags each request with a UUID span and echoes it in `x-request-id`
async fn request_id(request: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    let span = info_span!(
        "request",
        id = %id,
        method = %request.method(),
        path = %request.uri().path()
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "flood-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Run one assessment. Input is validated here so a bad coordinate is a 400
/// before any provider is touched; everything after that yields a record.
pub async fn assess_flood_risk(
    State(state): State<AppState>,
    payload: Result<Json<AssessmentRequest>, JsonRejection>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let Json(request) = payload?;
    request.coordinate()?;
    let language = request.language();

    let service = state.service.clone();
    let mut task = tokio::spawn(
        async move {
            let mut rng = SeededRandom::from_entropy();
            service.assess_within_budget(&request, Utc::now(), &mut rng).await
        }
        .in_current_span(),
    );
    // Dropping the handler (client went away) cancels the provider calls
    let _abort = AbortOnDrop(task.abort_handle());

    match (&mut task).await {
        Ok(result) => Ok(Json(result?)),
        Err(e) => {
            error!("Assessment task failed: {}", e);
            let mut rng = SeededRandom::from_entropy();
            Ok(Json(fallback_assessment(&mut rng, Utc::now(), language)))
        }
    }
}

struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub async fn get_nearest_river(
    State(state): State<AppState>,
    query: Result<Query<PointQuery>, QueryRejection>,
) -> Result<Json<PointMatch>, ApiError> {
    let Query(query) = query?;
    let request = query.into_request();
    let coordinate = request.coordinate()?;

    Ok(Json(nearest_river(
        state.service.index(),
        &coordinate,
        request.language(),
    )))
}

pub async fn get_emergency_assistance(
    State(state): State<AppState>,
    query: Result<Query<PointQuery>, QueryRejection>,
) -> Result<Json<EmergencyAssistance>, ApiError> {
    let Query(query) = query?;
    let request = query.into_request();
    let coordinate = request.coordinate()?;

    Ok(Json(emergency_assistance(
        state.service.index(),
        &coordinate,
        request.language(),
    )))
}

pub async fn list_catalog(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let category = match category.as_str() {
        "rivers" => Category::River,
        "districts" => Category::District,
        "facilities" => Category::Facility,
        other => return Err(ApiError::not_found(format!("Unknown catalog: {}", other))),
    };

    let points: Vec<NamedPoint> = state.service.index().points(category).cloned().collect();
    Ok(Json(CatalogResponse {
        category,
        count: points.len(),
        points,
    }))
}
