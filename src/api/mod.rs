use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    EngineError, Money, OptimizationResult, Parameters, PeriodData, PreviewResult, Rate,
    SolverConfig, optimize, preview,
};

const SERVICE_NAME: &str = "wealthpath";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptimizePayload {
    initial_capital: Option<Money>,
    annual_return: Option<Rate>,
    discount_rate: Option<Rate>,
    risk_aversion: Option<Rate>,
    current_age: Option<u32>,
    life_expectancy: Option<u32>,
    inheritance_target: Option<Money>,
}

fn params_from_payload(payload: OptimizePayload) -> Parameters {
    let mut params = Parameters::defaults();
    if let Some(v) = payload.initial_capital {
        params.initial_capital = v;
    }
    if let Some(v) = payload.annual_return {
        params.annual_return = v;
    }
    if let Some(v) = payload.discount_rate {
        params.discount_rate = v;
    }
    if let Some(v) = payload.risk_aversion {
        params.risk_aversion = v;
    }
    if let Some(v) = payload.current_age {
        params.current_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        params.life_expectancy = v;
    }
    if let Some(v) = payload.inheritance_target {
        params.inheritance_target = v;
    }
    params
}

// Monetary fields leave the engine at 2 decimal places; rate fields are
// reported at 6.
fn round_rate(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptimizeResponse {
    initial_consumption: Money,
    total_utility: f64,
    final_capital: Money,
    horizon: u32,
    beta: f64,
    growth_rate: f64,
    series: Vec<PeriodData>,
    avg_consumption: Money,
    max_consumption: Money,
    min_consumption: Money,
}

impl From<OptimizationResult> for OptimizeResponse {
    fn from(result: OptimizationResult) -> Self {
        OptimizeResponse {
            initial_consumption: result.initial_consumption,
            total_utility: result.total_utility,
            final_capital: result.final_capital,
            horizon: result.horizon,
            beta: round_rate(result.beta),
            growth_rate: round_rate(result.growth_rate),
            series: result.series,
            avg_consumption: result.avg_consumption,
            max_consumption: result.max_consumption,
            min_consumption: result.min_consumption,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewResponse {
    initial_consumption: Money,
    beta: f64,
    growth_rate: f64,
    horizon: u32,
}

impl From<PreviewResult> for PreviewResponse {
    fn from(result: PreviewResult) -> Self {
        PreviewResponse {
            initial_consumption: result.initial_consumption,
            beta: round_rate(result.beta),
            growth_rate: round_rate(result.growth_rate),
            horizon: result.horizon,
        }
    }
}

/// Slider metadata for one parameter: its default plus the range a client
/// should offer.
#[derive(Debug, Serialize)]
struct ParamSpec<T: Serialize> {
    default: T,
    min: T,
    max: T,
    step: T,
    description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsResponse {
    initial_capital: ParamSpec<Money>,
    annual_return: ParamSpec<Rate>,
    discount_rate: ParamSpec<Rate>,
    risk_aversion: ParamSpec<Rate>,
    life_expectancy: ParamSpec<u32>,
    current_age: ParamSpec<u32>,
    inheritance_target: ParamSpec<Money>,
}

fn defaults_response() -> DefaultsResponse {
    let defaults = Parameters::defaults();
    DefaultsResponse {
        initial_capital: ParamSpec {
            default: defaults.initial_capital,
            min: dec!(1_000),
            max: dec!(100_000_000),
            step: dec!(10_000),
            description: "Initial capital/wealth (K0)",
        },
        annual_return: ParamSpec {
            default: defaults.annual_return,
            min: dec!(0.001),
            max: dec!(0.30),
            step: dec!(0.005),
            description: "Annual return rate (r)",
        },
        discount_rate: ParamSpec {
            default: defaults.discount_rate,
            min: dec!(0.001),
            max: dec!(0.20),
            step: dec!(0.005),
            description: "Time preference rate (rho)",
        },
        risk_aversion: ParamSpec {
            default: defaults.risk_aversion,
            min: dec!(0.1),
            max: dec!(10.0),
            step: dec!(0.1),
            description: "CRRA risk aversion coefficient (sigma)",
        },
        life_expectancy: ParamSpec {
            default: defaults.life_expectancy,
            min: 50,
            max: 120,
            step: 1,
            description: "Expected lifespan (T)",
        },
        current_age: ParamSpec {
            default: defaults.current_age,
            min: 18,
            max: 100,
            step: 1,
            description: "Current age (t0)",
        },
        inheritance_target: ParamSpec {
            default: defaults.inheritance_target,
            min: dec!(0),
            max: dec!(100_000_000),
            step: dec!(10_000),
            description: "Target bequest (K_T)",
        },
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    service: &'static str,
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("wealthpath API listening on http://{addr}");
    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/v1/optimize", post(optimize_handler))
        .route("/api/v1/optimize/preview", post(preview_handler))
        .route("/api/v1/parameters/defaults", get(defaults_handler))
        .fallback(not_found_handler)
}

async fn root_handler() -> Response {
    json_response(
        StatusCode::OK,
        ServiceInfo {
            name: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            service: SERVICE_NAME,
        },
    )
}

async fn defaults_handler() -> Response {
    json_response(StatusCode::OK, defaults_response())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn optimize_handler(Json(payload): Json<OptimizePayload>) -> Response {
    let params = params_from_payload(payload);
    match optimize(&params, &SolverConfig::default()) {
        Ok(result) => json_response(StatusCode::OK, OptimizeResponse::from(result)),
        Err(err) => engine_error_response(&err),
    }
}

async fn preview_handler(Json(payload): Json<OptimizePayload>) -> Response {
    let params = params_from_payload(payload);
    match preview(&params, &SolverConfig::default()) {
        Ok(result) => json_response(StatusCode::OK, PreviewResponse::from(result)),
        Err(err) => engine_error_response(&err),
    }
}

fn engine_error_response(err: &EngineError) -> Response {
    error_response(status_for(err), &err.to_string())
}

fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        // Parameters were individually valid; the target is what failed.
        EngineError::InfeasibleTarget { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::NonPositiveConsumption { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn params_from_json(json: &str) -> Result<Parameters, String> {
    serde_json::from_str::<OptimizePayload>(json)
        .map(params_from_payload)
        .map_err(|e| format!("invalid optimization payload: {e}"))
}
