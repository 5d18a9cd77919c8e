//! Phone call API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ringback_core::{CallError, CallOutcome, PhoneNumber, ProviderError, StoreError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// JSON field carrying the number in call-start requests.
const PHONE_NUMBER_FIELD: &str = "phone-number";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for transcript lookups
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    pub phone_number: String,
    pub transcript: String,
    pub has_transcript: bool,
}

/// Response for latest execution lookups
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestExecutionResponse {
    pub phone_number: String,
    pub execution_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Provider response body, when the provider answered with an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error returned by the call handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                details: None,
            },
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }
}

impl From<CallError> for ApiError {
    fn from(err: CallError) -> Self {
        let message = err.to_string();
        match err {
            CallError::InvalidPhoneNumber => Self::bad_request(message),
            CallError::Store(_) | CallError::MissingExecutionId => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            CallError::Provider(ProviderError::Api { body, .. }) => Self {
                status: StatusCode::BAD_GATEWAY,
                body: ErrorResponse {
                    error: message,
                    details: Some(body),
                },
            },
            CallError::Provider(_) => Self::new(StatusCode::BAD_GATEWAY, message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Pull the phone number out of a call-start request body.
fn phone_number_from_body(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<PhoneNumber, ApiError> {
    let Json(body) =
        body.map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;

    let raw = body
        .get(PHONE_NUMBER_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("phone-number must be a non-empty string"))?;

    Ok(PhoneNumber::parse(raw)?)
}

/// Provider call-start payload with the execution id, transcript and status tag merged in.
fn outcome_body(outcome: CallOutcome) -> Value {
    let status = outcome.status_tag();
    let transcript = outcome.transcript().map(str::to_string);

    let mut body = match outcome.provider_payload {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("execution_id".to_string(), Value::String(outcome.execution_id));
    match transcript {
        Some(transcript) => {
            body.insert("transcript".to_string(), Value::String(transcript));
        }
        None => {
            body.remove("transcript");
        }
    }
    body.insert("status".to_string(), Value::String(status.to_string()));

    Value::Object(body)
}

/// Map a pass-through provider failure to a response.
///
/// Provider error responses are forwarded with their status and body.
fn passthrough_error(err: ProviderError) -> Response {
    match err {
        ProviderError::Api { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(body)).into_response()
        }
        other => ApiError::new(StatusCode::BAD_GATEWAY, other.to_string()).into_response(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a call and wait for its transcript
pub async fn start_call(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let phone = phone_number_from_body(body)?;
    let outcome = state.calls().start_and_wait(&phone).await?;

    Ok((StatusCode::CREATED, Json(outcome_body(outcome))))
}

/// Start a call and return without waiting for the transcript
pub async fn start_call_nonblocking(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let phone = phone_number_from_body(body)?;
    let detached = state.calls().start_detached(&phone).await?;

    // The watcher keeps running after its handle is dropped
    Ok((StatusCode::ACCEPTED, Json(outcome_body(detached.outcome))))
}

/// Fetch execution status from the provider
pub async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(execution_id): Path<String>,
) -> Response {
    match state.calls().execution(&execution_id).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            warn!(execution_id = %execution_id, "Failed to fetch execution: {}", e);
            passthrough_error(e)
        }
    }
}

/// Fetch the execution log from the provider
pub async fn get_execution_log(
    State(state): State<Arc<AppState>>,
    Path(execution_id): Path<String>,
) -> Response {
    match state.calls().execution_log(&execution_id).await {
        Ok(payload) => Json(payload).into_response(),
        Err(e) => {
            warn!(execution_id = %execution_id, "Failed to fetch execution log: {}", e);
            passthrough_error(e)
        }
    }
}

/// Get the stored transcript for a phone number
pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(phone_number): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let phone = PhoneNumber::parse(&phone_number)?;

    match state.calls().transcript(&phone)? {
        Some(user) => Ok(Json(TranscriptResponse {
            has_transcript: user.has_transcript(),
            phone_number: user.number,
            transcript: user.transcript,
        })),
        None => Err(ApiError::not_found(format!(
            "No record for phone number: {}",
            phone
        ))),
    }
}

/// Get the latest execution started for a phone number
pub async fn get_latest_execution(
    State(state): State<Arc<AppState>>,
    Path(phone_number): Path<String>,
) -> Result<Json<LatestExecutionResponse>, ApiError> {
    let phone = PhoneNumber::parse(&phone_number)?;

    match state.calls().latest_execution(&phone).await {
        Some(execution_id) => Ok(Json(LatestExecutionResponse {
            phone_number: phone.as_str().to_string(),
            execution_id,
        })),
        None => Err(ApiError::not_found(format!(
            "No execution recorded for phone number: {}",
            phone
        ))),
    }
}
