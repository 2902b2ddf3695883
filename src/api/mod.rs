//! HTTP register endpoint
//!
//! `GET /api/{address}?size=N` reads, `POST /api/{address}` with
//! `{"data": "<hex>"}` writes. Both answer with the address, the raw hex
//! data and a best-effort integer decode.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::Error;
use crate::protocol::{Outcome, RegisterAccess};
use crate::transform::decode_by_width;
use crate::util::{check_size, format_address, parse_address, parse_data};

/// Register size used when a read does not name one
const DEFAULT_SIZE: usize = 2;

#[derive(Clone)]
struct ApiState {
    registers: Arc<dyn RegisterAccess>,
}

#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct WriteBody {
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub address: String,
    pub size: usize,
    pub data: Option<String>,
    pub value: Option<i64>,
    pub outcome: &'static str,
}

impl RegisterResponse {
    fn new(address: u16, size: usize, data: Option<&[u8]>, outcome: &'static str) -> Self {
        RegisterResponse {
            address: format_address(address),
            size,
            data: data.map(hex::encode),
            value: data.and_then(decode_by_width),
            outcome,
        }
    }
}

/// Error answer of the endpoint
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(Error::invalid_argument(rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::invalid_argument(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "register request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Builds the router serving the register endpoint
pub fn router(registers: Arc<dyn RegisterAccess>) -> Router {
    Router::new()
        .route("/api/{address}", get(read_register).post(write_register))
        .with_state(ApiState { registers })
}

async fn read_register(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    query: Result<Query<ReadQuery>, QueryRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Query(query) = query?;
    let address = parse_address(&address)?;
    let size = check_size(query.size.unwrap_or(DEFAULT_SIZE))?;

    let registers = Arc::clone(&state.registers);
    let outcome = blocking(move || registers.read_register(address, size)).await?;

    let response = match &outcome {
        Outcome::Success(data) => RegisterResponse::new(address, size as usize, Some(data.as_slice()), outcome.label()),
        _ => {
            warn!(address, outcome = outcome.label(), "register read returned no data");
            RegisterResponse::new(address, size as usize, None, outcome.label())
        }
    };
    Ok(Json(response))
}

async fn write_register(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    body: Result<Json<WriteBody>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(body) = body?;
    let address = parse_address(&address)?;
    let data = parse_data(&body.data)?;

    let registers = Arc::clone(&state.registers);
    let payload = data.clone();
    let outcome = blocking(move || registers.write_register(address, &payload)).await?;

    if outcome.is_success() {
        info!(address, data = %hex::encode(&data), "register written");
    } else {
        warn!(address, outcome = outcome.label(), "register write failed");
    }
    Ok(Json(RegisterResponse::new(address, data.len(), Some(data.as_slice()), outcome.label())))
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::invalid_state(format!("register task failed: {}", e)))?
        .map_err(ApiError::from)
}
