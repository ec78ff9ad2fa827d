mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderName, StatusCode, header, header::InvalidHeaderName},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorKind};

use crate::config::ServerConfig;
use crate::core::{
    MAX_HORIZON_YEARS, ProjectionInput, ProjectionPoint, ProjectionSeries, ProjectionSummary,
    RawProjectionInput, project, summarize,
};
use crate::history::{
    CalculationKind, CalculationParams, Caller, HistoryService, MAX_LIST_LIMIT, SavedCalculation,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Shared state handed to every handler.
pub struct AppState {
    history: HistoryService,
    identity_header: HeaderName,
}

impl AppState {
    /// `identity_header` names the header an auth proxy sets to the caller's
    /// account identifier.
    pub fn new(history: HistoryService, identity_header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            history,
            identity_header: HeaderName::try_from(identity_header.trim().to_ascii_lowercase())?,
        })
    }

    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    fn caller(&self, headers: &HeaderMap) -> Caller {
        let raw = headers
            .get(&self.identity_header)
            .and_then(|value| value.to_str().ok());
        Caller::from_header_value(raw)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    kind: Option<CalculationKind>,
    initial_balance: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_return_percent: Option<f64>,
    horizon_years: Option<f64>,
    current_age: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePayload {
    kind: CalculationKind,
    input: ProjectionInput,
    current_age: Option<u32>,
    final_point: Option<ProjectionPoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    kind: CalculationKind,
    input: ProjectionInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retirement_age: Option<u32>,
    summary: ProjectionSummary,
    series: ProjectionSeries,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    service: &'static str,
    version: &'static str,
    history_backend: &'static str,
    identity_header: String,
    max_list_limit: u32,
    max_horizon_years: u32,
}

/// Form defaults per calculator tab, applied to any field the caller omits.
fn default_raw_input(kind: CalculationKind) -> (RawProjectionInput, Option<u32>) {
    match kind {
        CalculationKind::Stock => (
            RawProjectionInput {
                initial_balance: 10_000.0,
                monthly_contribution: 500.0,
                annual_return_percent: 8.0,
                horizon_years: 20.0,
            },
            None,
        ),
        CalculationKind::Retirement => (
            RawProjectionInput {
                initial_balance: 50_000.0,
                monthly_contribution: 1_000.0,
                annual_return_percent: 7.0,
                horizon_years: 30.0,
            },
            Some(35),
        ),
    }
}

fn params_from_payload(payload: ProjectPayload) -> Result<CalculationParams, ApiError> {
    let kind = payload.kind.unwrap_or(CalculationKind::Stock);
    let (mut raw, default_age) = default_raw_input(kind);

    if let Some(v) = payload.initial_balance {
        raw.initial_balance = v;
    }
    if let Some(v) = payload.monthly_contribution {
        raw.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_return_percent {
        raw.annual_return_percent = v;
    }
    if let Some(v) = payload.horizon_years {
        raw.horizon_years = v;
    }

    let input = ProjectionInput::try_from(raw)?;
    Ok(match kind {
        CalculationKind::Stock => CalculationParams::Stock { input },
        CalculationKind::Retirement => CalculationParams::Retirement {
            input,
            current_age: payload.current_age.or(default_age).unwrap_or_default(),
        },
    })
}

fn params_from_save(payload: &SavePayload) -> Result<CalculationParams, ApiError> {
    let input = payload.input;
    match payload.kind {
        CalculationKind::Stock => Ok(CalculationParams::Stock { input }),
        CalculationKind::Retirement => {
            let current_age = payload.current_age.ok_or_else(|| {
                ApiError::Validation(
                    "currentAge is required for retirement calculations".to_string(),
                )
            })?;
            Ok(CalculationParams::Retirement { input, current_age })
        }
    }
}

fn build_project_response(params: CalculationParams) -> ProjectResponse {
    let series = project(params.input());
    let current_age = match params {
        CalculationParams::Stock { .. } => None,
        CalculationParams::Retirement { current_age, .. } => Some(current_age),
    };

    ProjectResponse {
        kind: params.kind(),
        input: *params.input(),
        current_age,
        retirement_age: params.retirement_age(),
        summary: summarize(&series),
        series,
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/calculations",
            get(list_calculations_handler).post(save_calculation_handler),
        )
        .route("/api/status", get(status_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_http_server(config: &ServerConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "nestegg HTTP API listening");
    tracing::info!("Local access: http://127.0.0.1:{}/", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    ApiError::NotFound.into_response()
}

async fn project_get_handler(
    payload: Result<Query<ProjectPayload>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    project_handler_impl(payload)
}

async fn project_post_handler(
    payload: Result<Json<ProjectPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Result<Response, ApiError> {
    let params = params_from_payload(payload)?;
    Ok(json_response(StatusCode::OK, build_project_response(params)))
}

async fn list_calculations_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let caller = state.caller(&headers);

    let rows: Vec<SavedCalculation> = state
        .history
        .list(&caller, query.limit)
        .await
        .map_err(|e| ApiError::from_history(e, "Failed to fetch calculations"))?;
    Ok(json_response(StatusCode::OK, rows))
}

async fn save_calculation_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SavePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    // Identity is checked before the body so anonymous callers always see 401.
    let caller = state.caller(&headers);
    if caller.owner().is_none() {
        return Err(ApiError::Unauthorized);
    }

    let Json(payload) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let params = params_from_save(&payload)?;
    let final_point = payload
        .final_point
        .unwrap_or_else(|| project(params.input()).final_point());

    let saved = state
        .history
        .save(&caller, params, final_point)
        .await
        .map_err(|e| ApiError::from_history(e, "Failed to save calculation"))?;
    Ok(json_response(StatusCode::CREATED, saved))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Response {
    json_response(
        StatusCode::OK,
        StatusResponse {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            history_backend: state.history.backend(),
            identity_header: state.identity_header.as_str().to_owned(),
            max_list_limit: MAX_LIST_LIMIT,
            max_horizon_years: MAX_HORIZON_YEARS,
        },
    )
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}
